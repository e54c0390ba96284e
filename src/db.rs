//! Database initialization for the application's SQLite schema.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    category::create_category_table,
    status::{create_status_table, seed_default_statuses},
    transaction::create_transaction_table,
};

/// Create the tables for the domain models and seed the global reference
/// data, all within a single SQL transaction.
///
/// The reference columns on the transaction table deliberately carry no
/// foreign key constraints: a transaction keeps its category/account/status
/// IDs even after the referenced row is deleted, and resolution of a
/// dangling reference yields nothing rather than an error.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL
/// error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_account_table(&transaction)?;
    create_status_table(&transaction)?;
    create_transaction_table(&transaction)?;
    seed_default_statuses(&transaction)?;

    transaction.commit()?;

    Ok(())
}
