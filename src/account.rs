//! Accounts record where money lives, e.g. "Everyday" at "Kiwibank". Each
//! account belongs to one user and, like a category, carries a cached count
//! of the transactions currently referencing it.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, OwnerId},
    options::SelectOption,
};

/// A user's account that transactions are recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID of the account.
    pub id: AccountId,
    /// The name of the account.
    pub name: String,
    /// The institution holding the account, e.g. a bank name.
    pub institution: String,
    /// The display color of the account.
    pub color: String,
    /// The number of live transactions referencing this account.
    ///
    /// A derived cache maintained incrementally by the ledger, same as the
    /// category counter.
    pub transaction_count: i64,
    /// The ID of the user that owns the account.
    pub owner_id: OwnerId,
}

/// The fields needed to create an account, or to overwrite one on update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    /// The name of the account.
    pub name: String,
    /// The institution holding the account.
    pub institution: String,
    /// The display color of the account.
    pub color: String,
}

/// Create an account in the database.
///
/// New accounts start with a transaction count of zero.
///
/// # Errors
/// This function will return an:
/// - [Error::EmptyAccountName] if the name is empty or just whitespace,
/// - or [Error::SqlError] if there is an SQL error.
pub fn create_account(
    new_account: NewAccount,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = new_account.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    connection.execute(
        "INSERT INTO transaction_account (name, institution, color, transaction_count, owner_id)
         VALUES (?1, ?2, ?3, 0, ?4)",
        (name, &new_account.institution, &new_account.color, owner_id),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        name: name.to_owned(),
        institution: new_account.institution,
        color: new_account.color,
        transaction_count: 0,
        owner_id,
    })
}

/// Retrieve an account owned by `owner_id` from the database by its `id`.
///
/// An account owned by another user is reported the same way as a missing
/// one, so nothing leaks about other tenants' data.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an account owned by
///   `owner_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account(
    id: AccountId,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, name, institution, color, transaction_count, owner_id
             FROM transaction_account WHERE id = :id AND owner_id = :owner_id",
        )?
        .query_row(&[(":id", &id), (":owner_id", &owner_id)], map_account_row)
        .map_err(|error| error.into())
}

/// Retrieve the accounts owned by `owner_id`, ordered by name.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_accounts(owner_id: OwnerId, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, name, institution, color, transaction_count, owner_id
             FROM transaction_account WHERE owner_id = :owner_id ORDER BY name ASC",
        )?
        .query_map(&[(":owner_id", &owner_id)], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the fields of the account `id` owned by `owner_id`.
///
/// The transaction count is not a settable field and is left untouched.
///
/// # Errors
/// This function will return an:
/// - [Error::EmptyAccountName] if the new name is empty or just whitespace,
/// - [Error::UpdateMissingAccount] if `id` does not refer to an account
///   owned by `owner_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_account(
    id: AccountId,
    owner_id: OwnerId,
    changes: NewAccount,
    connection: &Connection,
) -> Result<(), Error> {
    let name = changes.name.trim();

    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    let rows_affected = connection.execute(
        "UPDATE transaction_account SET name = ?1, institution = ?2, color = ?3
         WHERE id = ?4 AND owner_id = ?5",
        (name, &changes.institution, &changes.color, id, owner_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

/// Delete the account `id` owned by `owner_id` from the database.
///
/// Transactions referencing the account are not touched: their references
/// dangle and resolve to nothing from then on.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingAccount] if `id` does not refer to an account
///   owned by `owner_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_account(
    id: AccountId,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM transaction_account WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAccount);
    }

    Ok(())
}

/// Retrieve the accounts owned by `owner_id` projected to options for the
/// transaction form dropdown.
///
/// The dropdown only needs a value and a label; the richer projection with
/// institution and color comes from resolving an account reference.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn account_options(
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Vec<SelectOption>, Error> {
    let accounts = list_accounts(owner_id, connection)?;

    Ok(accounts
        .into_iter()
        .map(|account| SelectOption::new(account.id, account.name))
        .collect())
}

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transaction_account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            institution TEXT NOT NULL,
            color TEXT NOT NULL,
            transaction_count INTEGER NOT NULL DEFAULT 0,
            owner_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_account_owner ON transaction_account(owner_id);",
    )?;

    Ok(())
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let institution = row.get(2)?;
    let color = row.get(3)?;
    let transaction_count = row.get(4)?;
    let owner_id = row.get(5)?;

    Ok(Account {
        id,
        name,
        institution,
        color,
        transaction_count,
        owner_id,
    })
}
