//! The transaction ledger: creating, updating, and deleting the records of
//! money spent or earned, and keeping the category/account transaction
//! counters in step with every mutation.
//!
//! Counter maintenance is best-effort by design. The primary write is
//! authoritative: counter adjustments are issued as separate statements
//! after it, and a failed adjustment is logged rather than rolling anything
//! back. A reconciliation job could recompute the counters by full scan;
//! this module never does.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, account, category,
    counter::{CountedCollection, adjust_transaction_count},
    database_id::{AccountId, CategoryId, DatabaseId, OwnerId, StatusId, TransactionId},
    options::SelectOption,
    status,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction records money coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned, e.g. a salary payment.
    Income,
    /// Money spent, e.g. rent.
    Expense,
}

impl TransactionKind {
    /// The kind as the lowercase string stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Apply the sign implied by this kind to an unsigned amount.
    ///
    /// Amounts are stored unsigned; displays that want income positive and
    /// expenses negative derive the sign here.
    pub fn apply_sign(self, amount: f64) -> f64 {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::InvalidTransactionKind(other.to_string())),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// A record of money spent or earned, as stored in the ledger.
///
/// The category, account, and status fields are back-references: bare IDs
/// plus a lookup, never owning pointers. The referenced rows may be deleted
/// out from under a transaction, in which case resolution yields nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The amount of money, always non-negative; the sign is derived from
    /// `kind` when displayed.
    pub amount: f64,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The ID of the account the transaction was recorded against.
    pub account_id: AccountId,
    /// The ID of the transaction's status.
    pub status_id: StatusId,
    /// The ID of the user that owns the transaction.
    pub owner_id: OwnerId,
}

/// The mutable fields of a transaction: everything needed to create one, or
/// to overwrite an existing one on update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The amount of money, must be finite and non-negative.
    pub amount: f64,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// The ID of the account the transaction was recorded against.
    pub account_id: AccountId,
    /// The ID of the transaction's status.
    pub status_id: StatusId,
}

/// A transaction with its references resolved for display.
///
/// This is the element type pushed to list subscribers: each reference
/// becomes an option the UI can render directly, or `None` if the
/// referenced row no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionView {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The amount of money, always non-negative.
    pub amount: f64,
    /// The transaction's category, or `None` if it was deleted.
    pub category: Option<SelectOption>,
    /// The transaction's account, or `None` if it was deleted.
    pub account: Option<SelectOption>,
    /// The transaction's status, or `None` if it is unknown.
    pub status: Option<SelectOption>,
    /// The ID of the user that owns the transaction.
    pub owner_id: OwnerId,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the ledger and bump the referenced category
/// and account counters by one each.
///
/// The counter increments are issued after the insert and are best-effort: a
/// failed increment is logged and the created transaction stands.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidAmount] if the amount is not a finite, non-negative
///   number,
/// - [Error::UnresolvedCategory]/[Error::UnresolvedAccount]/
///   [Error::UnresolvedStatus] if a reference does not resolve for
///   `owner_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    validate_amount(new_transaction.amount)?;
    resolve_references(&new_transaction, owner_id, connection)?;

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\"
                (date, description, kind, amount, category_id, account_id, status_id, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id, date, description, kind, amount, category_id, account_id, status_id, owner_id",
        )?
        .query_row(
            (
                new_transaction.date,
                &new_transaction.description,
                new_transaction.kind,
                new_transaction.amount,
                new_transaction.category_id,
                new_transaction.account_id,
                new_transaction.status_id,
                owner_id,
            ),
            map_transaction_row,
        )?;

    adjust_count_or_warn(
        CountedCollection::Categories,
        transaction.category_id,
        1,
        connection,
    );
    adjust_count_or_warn(
        CountedCollection::Accounts,
        transaction.account_id,
        1,
        connection,
    );

    Ok(transaction)
}

/// Overwrite the mutable fields of the transaction `id`.
///
/// The caller supplies the category and account IDs the record had before
/// the update. Each reference is treated as an independent toggle: if the
/// category changed, the previous category's counter is decremented and the
/// new one's incremented, each exactly once; likewise for the account.
/// Changing only amount, date, description, kind, or status touches no
/// counter.
///
/// # Errors
/// This function will return an:
/// - [Error::InvalidAmount] if the new amount is not a finite, non-negative
///   number,
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a
///   transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    changes: NewTransaction,
    previous_category_id: CategoryId,
    previous_account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    validate_amount(changes.amount)?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET date = ?1, description = ?2, kind = ?3, amount = ?4,
             category_id = ?5, account_id = ?6, status_id = ?7
         WHERE id = ?8",
        (
            changes.date,
            &changes.description,
            changes.kind,
            changes.amount,
            changes.category_id,
            changes.account_id,
            changes.status_id,
            id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    if changes.category_id != previous_category_id {
        adjust_count_or_warn(
            CountedCollection::Categories,
            previous_category_id,
            -1,
            connection,
        );
        adjust_count_or_warn(
            CountedCollection::Categories,
            changes.category_id,
            1,
            connection,
        );
    }

    if changes.account_id != previous_account_id {
        adjust_count_or_warn(
            CountedCollection::Accounts,
            previous_account_id,
            -1,
            connection,
        );
        adjust_count_or_warn(
            CountedCollection::Accounts,
            changes.account_id,
            1,
            connection,
        );
    }

    Ok(())
}

/// Delete the transaction `id` from the ledger and decrement the given
/// category and account counters by one each.
///
/// The caller supplies the IDs being decremented: it is assumed to agree
/// with the store on the record's current linkage. The decrements are
/// attempted regardless of whether the parent rows still exist; a decrement
/// that finds nothing is logged and the deletion stands.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a
///   transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    category_id: CategoryId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    adjust_count_or_warn(CountedCollection::Categories, category_id, -1, connection);
    adjust_count_or_warn(CountedCollection::Accounts, account_id, -1, connection);

    Ok(())
}

/// Retrieve a transaction from the ledger by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, date, description, kind, amount, category_id, account_id, status_id, owner_id
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)
        .map_err(|error| error.into())
}

/// Retrieve the transactions owned by `owner_id` with their references
/// resolved, most recent first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_transactions(
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Vec<TransactionView>, Error> {
    query_transaction_views(owner_id, None, connection)
}

/// Retrieve the most recent `limit` transactions owned by `owner_id` with
/// their references resolved.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn latest_transactions(
    owner_id: OwnerId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<TransactionView>, Error> {
    query_transaction_views(owner_id, Some(limit), connection)
}

fn query_transaction_views(
    owner_id: OwnerId,
    limit: Option<u32>,
    connection: &Connection,
) -> Result<Vec<TransactionView>, Error> {
    let limit_clause = match limit {
        Some(limit) => format!("LIMIT {limit}"),
        None => String::new(),
    };

    // Sort by date, and then ID to keep transaction order stable after
    // updates.
    let query = format!(
        "SELECT t.id, t.date, t.description, t.kind, t.amount,
                t.category_id, c.name,
                t.account_id, a.name, a.institution, a.color,
                t.status_id, s.name,
                t.owner_id
         FROM \"transaction\" t
         LEFT JOIN transaction_category c ON c.id = t.category_id AND c.owner_id = t.owner_id
         LEFT JOIN transaction_account a ON a.id = t.account_id AND a.owner_id = t.owner_id
         LEFT JOIN transaction_status s ON s.id = t.status_id
         WHERE t.owner_id = :owner_id
         ORDER BY t.date DESC, t.id ASC {limit_clause}"
    );

    connection
        .prepare(&query)?
        .query_map(&[(":owner_id", &owner_id)], map_transaction_view_row)?
        .map(|maybe_view| maybe_view.map_err(|error| error.into()))
        .collect()
}

/// Create the transaction table in the database.
///
/// The reference columns deliberately carry no foreign key constraints so
/// that references may dangle after a category/account/status is deleted.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            kind TEXT NOT NULL,
            amount REAL NOT NULL,
            category_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            status_id INTEGER NOT NULL,
            owner_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_owner_date ON \"transaction\"(owner_id, date);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        kind: row.get(3)?,
        amount: row.get(4)?,
        category_id: row.get(5)?,
        account_id: row.get(6)?,
        status_id: row.get(7)?,
        owner_id: row.get(8)?,
    })
}

fn map_transaction_view_row(row: &Row) -> Result<TransactionView, rusqlite::Error> {
    let category = match row.get::<usize, Option<String>>(6)? {
        Some(name) => Some(SelectOption::new(row.get(5)?, name)),
        None => None,
    };

    let account = match row.get::<usize, Option<String>>(8)? {
        Some(name) => Some(SelectOption {
            value: row.get(7)?,
            label: name,
            institution: row.get(9)?,
            color: row.get(10)?,
        }),
        None => None,
    };

    let status = match row.get::<usize, Option<String>>(12)? {
        Some(name) => Some(SelectOption::new(row.get(11)?, name)),
        None => None,
    };

    Ok(TransactionView {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        kind: row.get(3)?,
        amount: row.get(4)?,
        category,
        account,
        status,
        owner_id: row.get(13)?,
    })
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(())
}

fn resolve_references(
    new_transaction: &NewTransaction,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<(), Error> {
    category::get_category(new_transaction.category_id, owner_id, connection).map_err(
        |error| match error {
            Error::NotFound => Error::UnresolvedCategory(new_transaction.category_id),
            error => error,
        },
    )?;

    account::get_account(new_transaction.account_id, owner_id, connection).map_err(
        |error| match error {
            Error::NotFound => Error::UnresolvedAccount(new_transaction.account_id),
            error => error,
        },
    )?;

    status::get_status(new_transaction.status_id, connection).map_err(|error| match error {
        Error::NotFound => Error::UnresolvedStatus(new_transaction.status_id),
        error => error,
    })?;

    Ok(())
}

/// Apply a counter delta, logging instead of failing.
///
/// Counter maintenance must never abort the primary write that triggered
/// it: the ledger record is authoritative and a drifted counter is
/// detectable by full scan.
fn adjust_count_or_warn(
    collection: CountedCollection,
    id: DatabaseId,
    delta: i64,
    connection: &Connection,
) {
    if let Err(error) = adjust_transaction_count(collection, id, delta, connection) {
        tracing::warn!(
            "could not apply transaction count delta {delta} to {collection:?} row {id}: {error}"
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod ledger_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, NewAccount, create_account, get_account},
        category::{Category, CategoryName, NewCategory, create_category, get_category},
        db::initialize,
        status::list_statuses,
    };

    use super::{
        NewTransaction, TransactionKind, create_transaction, delete_transaction, get_transaction,
        latest_transactions, list_transactions, update_transaction,
    };

    const OWNER: i64 = 1;

    struct Fixture {
        conn: Connection,
        category: Category,
        account: Account,
        status_id: i64,
    }

    fn get_test_fixture() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let category = create_category(
            NewCategory {
                name: CategoryName::new_unchecked("Rent"),
                kind: TransactionKind::Expense,
                icon: "home".to_owned(),
                color: "#ff0000".to_owned(),
            },
            OWNER,
            &conn,
        )
        .unwrap();

        let account = create_account(
            NewAccount {
                name: "Everyday".to_owned(),
                institution: "Kiwibank".to_owned(),
                color: "#336699".to_owned(),
            },
            OWNER,
            &conn,
        )
        .unwrap();

        let status_id = list_statuses(&conn).unwrap()[0].id;

        Fixture {
            conn,
            category,
            account,
            status_id,
        }
    }

    fn new_transaction(fixture: &Fixture, amount: f64) -> NewTransaction {
        NewTransaction {
            date: date!(2025 - 06 - 15),
            description: "Flat rent".to_owned(),
            kind: TransactionKind::Expense,
            amount,
            category_id: fixture.category.id,
            account_id: fixture.account.id,
            status_id: fixture.status_id,
        }
    }

    fn category_count(fixture: &Fixture, id: i64) -> i64 {
        get_category(id, OWNER, &fixture.conn)
            .unwrap()
            .transaction_count
    }

    fn account_count(fixture: &Fixture, id: i64) -> i64 {
        get_account(id, OWNER, &fixture.conn)
            .unwrap()
            .transaction_count
    }

    #[test]
    fn create_increments_both_counters_by_one() {
        let fixture = get_test_fixture();

        let transaction =
            create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();

        assert!(transaction.id > 0);
        assert_eq!(transaction.amount, 450.0);
        assert_eq!(category_count(&fixture, fixture.category.id), 1);
        assert_eq!(account_count(&fixture, fixture.account.id), 1);
    }

    #[test]
    fn create_fails_on_negative_amount() {
        let fixture = get_test_fixture();

        let result = create_transaction(new_transaction(&fixture, -1.0), OWNER, &fixture.conn);

        assert_eq!(result, Err(Error::InvalidAmount(-1.0)));
        assert_eq!(category_count(&fixture, fixture.category.id), 0);
    }

    #[test]
    fn create_fails_on_non_finite_amount() {
        let fixture = get_test_fixture();

        let result =
            create_transaction(new_transaction(&fixture, f64::INFINITY), OWNER, &fixture.conn);

        assert_eq!(result, Err(Error::InvalidAmount(f64::INFINITY)));
    }

    #[test]
    fn create_fails_on_unresolved_category() {
        let fixture = get_test_fixture();
        let mut fields = new_transaction(&fixture, 450.0);
        fields.category_id = 424242;

        let result = create_transaction(fields, OWNER, &fixture.conn);

        assert_eq!(result, Err(Error::UnresolvedCategory(424242)));
    }

    #[test]
    fn create_fails_on_unresolved_account() {
        let fixture = get_test_fixture();
        let mut fields = new_transaction(&fixture, 450.0);
        fields.account_id = 424242;

        let result = create_transaction(fields, OWNER, &fixture.conn);

        assert_eq!(result, Err(Error::UnresolvedAccount(424242)));
    }

    #[test]
    fn create_fails_on_unresolved_status() {
        let fixture = get_test_fixture();
        let mut fields = new_transaction(&fixture, 450.0);
        fields.status_id = 424242;

        let result = create_transaction(fields, OWNER, &fixture.conn);

        assert_eq!(result, Err(Error::UnresolvedStatus(424242)));
    }

    #[test]
    fn create_fails_on_category_of_another_owner() {
        // The category below belongs to OWNER; a different user must not be
        // able to reference it, and the error must not reveal that it
        // exists.
        let fixture = get_test_fixture();
        let foreign_account = create_account(
            NewAccount {
                name: "Other".to_owned(),
                institution: "Kiwibank".to_owned(),
                color: "#000000".to_owned(),
            },
            OWNER + 1,
            &fixture.conn,
        )
        .unwrap();
        let mut fields = new_transaction(&fixture, 450.0);
        fields.account_id = foreign_account.id;

        let result = create_transaction(fields, OWNER + 1, &fixture.conn);

        assert_eq!(result, Err(Error::UnresolvedCategory(fixture.category.id)));
    }

    #[test]
    fn update_of_amount_only_leaves_counters_untouched() {
        let fixture = get_test_fixture();
        let transaction =
            create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();

        let mut changes = new_transaction(&fixture, 475.0);
        changes.description = "Flat rent (increased)".to_owned();
        update_transaction(
            transaction.id,
            changes,
            transaction.category_id,
            transaction.account_id,
            &fixture.conn,
        )
        .unwrap();

        let updated = get_transaction(transaction.id, &fixture.conn).unwrap();
        assert_eq!(updated.amount, 475.0);
        assert_eq!(category_count(&fixture, fixture.category.id), 1);
        assert_eq!(account_count(&fixture, fixture.account.id), 1);
    }

    #[test]
    fn update_of_category_moves_one_count() {
        let fixture = get_test_fixture();
        let transaction =
            create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();
        let groceries = create_category(
            NewCategory {
                name: CategoryName::new_unchecked("Groceries"),
                kind: TransactionKind::Expense,
                icon: "cart".to_owned(),
                color: "#00ff00".to_owned(),
            },
            OWNER,
            &fixture.conn,
        )
        .unwrap();

        let mut changes = new_transaction(&fixture, 450.0);
        changes.category_id = groceries.id;
        update_transaction(
            transaction.id,
            changes,
            transaction.category_id,
            transaction.account_id,
            &fixture.conn,
        )
        .unwrap();

        assert_eq!(category_count(&fixture, fixture.category.id), 0);
        assert_eq!(category_count(&fixture, groceries.id), 1);
        // Account is unchanged, so its counter must be too.
        assert_eq!(account_count(&fixture, fixture.account.id), 1);
    }

    #[test]
    fn update_of_account_moves_one_count() {
        let fixture = get_test_fixture();
        let transaction =
            create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();
        let savings = create_account(
            NewAccount {
                name: "Savings".to_owned(),
                institution: "Kiwibank".to_owned(),
                color: "#999999".to_owned(),
            },
            OWNER,
            &fixture.conn,
        )
        .unwrap();

        let mut changes = new_transaction(&fixture, 450.0);
        changes.account_id = savings.id;
        update_transaction(
            transaction.id,
            changes,
            transaction.category_id,
            transaction.account_id,
            &fixture.conn,
        )
        .unwrap();

        assert_eq!(account_count(&fixture, fixture.account.id), 0);
        assert_eq!(account_count(&fixture, savings.id), 1);
        assert_eq!(category_count(&fixture, fixture.category.id), 1);
    }

    #[test]
    fn update_missing_transaction_fails() {
        let fixture = get_test_fixture();

        let result = update_transaction(
            999999,
            new_transaction(&fixture, 450.0),
            fixture.category.id,
            fixture.account.id,
            &fixture.conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_decrements_both_counters_by_one() {
        let fixture = get_test_fixture();
        let transaction =
            create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();

        delete_transaction(
            transaction.id,
            transaction.category_id,
            transaction.account_id,
            &fixture.conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(transaction.id, &fixture.conn),
            Err(Error::NotFound)
        );
        assert_eq!(category_count(&fixture, fixture.category.id), 0);
        assert_eq!(account_count(&fixture, fixture.account.id), 0);
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let fixture = get_test_fixture();

        let result =
            delete_transaction(999999, fixture.category.id, fixture.account.id, &fixture.conn);

        assert_eq!(result, Err(Error::DeleteMissingTransaction));
    }

    #[test]
    fn delete_succeeds_when_category_is_already_gone() {
        let fixture = get_test_fixture();
        let transaction =
            create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();
        crate::category::delete_category(fixture.category.id, OWNER, &fixture.conn).unwrap();

        let result = delete_transaction(
            transaction.id,
            transaction.category_id,
            transaction.account_id,
            &fixture.conn,
        );

        // The counter decrement has nowhere to land, but the deletion of the
        // record itself must still go through.
        assert_eq!(result, Ok(()));
        assert_eq!(
            get_transaction(transaction.id, &fixture.conn),
            Err(Error::NotFound)
        );
        assert_eq!(account_count(&fixture, fixture.account.id), 0);
    }

    #[test]
    fn list_resolves_references_to_options() {
        let fixture = get_test_fixture();
        create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();

        let views = list_transactions(OWNER, &fixture.conn).unwrap();

        assert_eq!(views.len(), 1);
        let view = &views[0];
        let category = view.category.as_ref().unwrap();
        assert_eq!(category.value, fixture.category.id);
        assert_eq!(category.label, "Rent");
        let account = view.account.as_ref().unwrap();
        assert_eq!(account.label, "Everyday");
        assert_eq!(account.institution.as_deref(), Some("Kiwibank"));
        assert!(view.status.is_some());
    }

    #[test]
    fn list_leaves_dangling_references_unresolved() {
        let fixture = get_test_fixture();
        create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();
        crate::category::delete_category(fixture.category.id, OWNER, &fixture.conn).unwrap();

        let views = list_transactions(OWNER, &fixture.conn).unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].category, None);
        assert!(views[0].account.is_some());
    }

    #[test]
    fn list_is_scoped_to_the_owner() {
        let fixture = get_test_fixture();
        create_transaction(new_transaction(&fixture, 450.0), OWNER, &fixture.conn).unwrap();

        let views = list_transactions(OWNER + 1, &fixture.conn).unwrap();

        assert_eq!(views, []);
    }

    #[test]
    fn latest_returns_most_recent_first_up_to_limit() {
        let fixture = get_test_fixture();
        for day in 1u8..=7 {
            let mut fields = new_transaction(&fixture, day as f64);
            fields.date = date!(2025 - 06 - 01).replace_day(day).unwrap();
            create_transaction(fields, OWNER, &fixture.conn).unwrap();
        }

        let views = latest_transactions(OWNER, 5, &fixture.conn).unwrap();

        assert_eq!(views.len(), 5);
        let days: Vec<u8> = views.iter().map(|view| view.date.day()).collect();
        assert_eq!(days, [7, 6, 5, 4, 3]);
    }
}
