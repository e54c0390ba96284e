//! Incremental maintenance of the per-category and per-account transaction
//! counts.
//!
//! Each call applies exactly one delta to exactly one counter field, as a
//! single atomic `UPDATE`. Whether a failed adjustment aborts anything is
//! the caller's decision: the ledger treats a missing parent row as a
//! logged no-op, so deleting a transaction still succeeds after its
//! category has been removed.

use rusqlite::Connection;

use crate::{Error, database_id::DatabaseId};

/// The collections that carry a `transaction_count` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CountedCollection {
    /// The `transaction_category` collection.
    Categories,
    /// The `transaction_account` collection.
    Accounts,
}

impl CountedCollection {
    fn table(self) -> &'static str {
        match self {
            CountedCollection::Categories => "transaction_category",
            CountedCollection::Accounts => "transaction_account",
        }
    }
}

/// Apply `delta` to the transaction count of the row `id` in `collection`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a row in the collection,
/// - or [Error::SqlError] if there is some other SQL error.
pub(crate) fn adjust_transaction_count(
    collection: CountedCollection,
    id: DatabaseId,
    delta: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let query = format!(
        "UPDATE {} SET transaction_count = transaction_count + ?1 WHERE id = ?2",
        collection.table()
    );

    let rows_affected = connection.execute(&query, (delta, id))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{NewAccount, create_account, get_account},
        category::{CategoryName, NewCategory, create_category, get_category},
        db::initialize,
        transaction::TransactionKind,
    };

    use super::{CountedCollection, adjust_transaction_count};

    const OWNER: i64 = 1;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn adjust_category_count_applies_single_delta() {
        let conn = get_test_connection();
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

        adjust_transaction_count(CountedCollection::Categories, category.id, 1, &conn).unwrap();
        adjust_transaction_count(CountedCollection::Categories, category.id, 1, &conn).unwrap();
        adjust_transaction_count(CountedCollection::Categories, category.id, -1, &conn).unwrap();

        let count = get_category(category.id, OWNER, &conn)
            .unwrap()
            .transaction_count;
        assert_eq!(count, 1);
    }

    #[test]
    fn adjust_account_count_applies_single_delta() {
        let conn = get_test_connection();
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

        adjust_transaction_count(CountedCollection::Accounts, account.id, 1, &conn).unwrap();

        let count = get_account(account.id, OWNER, &conn)
            .unwrap()
            .transaction_count;
        assert_eq!(count, 1);
    }

    #[test]
    fn adjust_count_of_missing_row_returns_not_found() {
        let conn = get_test_connection();

        let result = adjust_transaction_count(CountedCollection::Categories, 424242, -1, &conn);

        assert_eq!(result, Err(Error::NotFound));
    }
}
