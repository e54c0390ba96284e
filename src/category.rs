//! Categories group transactions by what the money was for, e.g.
//! "Groceries", "Rent", "Salary". Each category belongs to one user and
//! carries a cached count of the transactions currently referencing it.
//!
//! The count is maintained incrementally by the ledger, never recomputed
//! here.

use std::{fmt::Display, str::FromStr};

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{CategoryId, OwnerId},
    options::SelectOption,
    transaction::TransactionKind,
};

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`,
    /// because if the non-empty invariant is violated it will cause incorrect
    /// behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's category for grouping income or expense transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The name of the category.
    pub name: CategoryName,
    /// Whether transactions under this category are income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The name of the icon the UI shows next to the category.
    pub icon: String,
    /// The display color of the category.
    pub color: String,
    /// The number of live transactions referencing this category.
    ///
    /// A derived cache, not authoritative: it is adjusted by one on every
    /// attach/detach rather than recomputed from the ledger.
    pub transaction_count: i64,
    /// The ID of the user that owns the category.
    pub owner_id: OwnerId,
}

/// The fields needed to create a category, or to overwrite one on update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    /// The name of the category.
    pub name: CategoryName,
    /// Whether transactions under this category are income or expenses.
    pub kind: TransactionKind,
    /// The name of the icon the UI shows next to the category.
    pub icon: String,
    /// The display color of the category.
    pub color: String,
}

/// A user's categories projected to options and split by kind, for the
/// income/expense form dropdowns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOptions {
    /// Options for the income categories.
    pub income: Vec<SelectOption>,
    /// Options for the expense categories.
    pub expense: Vec<SelectOption>,
}

/// Create a category in the database.
///
/// New categories start with a transaction count of zero.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_category(
    new_category: NewCategory,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO transaction_category (name, kind, icon, color, transaction_count, owner_id)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        (
            new_category.name.as_ref(),
            new_category.kind,
            &new_category.icon,
            &new_category.color,
            owner_id,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name: new_category.name,
        kind: new_category.kind,
        icon: new_category.icon,
        color: new_category.color,
        transaction_count: 0,
        owner_id,
    })
}

/// Retrieve a category owned by `owner_id` from the database by its `id`.
///
/// A category owned by another user is reported the same way as a missing
/// one, so nothing leaks about other tenants' data.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a category owned by
///   `owner_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(
    id: CategoryId,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, icon, color, transaction_count, owner_id
             FROM transaction_category WHERE id = :id AND owner_id = :owner_id",
        )?
        .query_row(&[(":id", &id), (":owner_id", &owner_id)], map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve the categories owned by `owner_id`, ordered by name.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_categories(
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind, icon, color, transaction_count, owner_id
             FROM transaction_category WHERE owner_id = :owner_id ORDER BY name ASC",
        )?
        .query_map(&[(":owner_id", &owner_id)], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Overwrite the fields of the category `id` owned by `owner_id`.
///
/// The transaction count is not a settable field and is left untouched.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingCategory] if `id` does not refer to a category
///   owned by `owner_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_category(
    id: CategoryId,
    owner_id: OwnerId,
    changes: NewCategory,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE transaction_category SET name = ?1, kind = ?2, icon = ?3, color = ?4
         WHERE id = ?5 AND owner_id = ?6",
        (
            changes.name.as_ref(),
            changes.kind,
            &changes.icon,
            &changes.color,
            id,
            owner_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(())
}

/// Delete the category `id` owned by `owner_id` from the database.
///
/// Transactions referencing the category are not touched: their references
/// dangle and resolve to nothing from then on.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingCategory] if `id` does not refer to a category
///   owned by `owner_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(
    id: CategoryId,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM transaction_category WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Retrieve the categories owned by `owner_id` projected to options, split
/// into income and expense lists for the transaction form.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn category_options(
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<CategoryOptions, Error> {
    let categories = list_categories(owner_id, connection)?;

    let mut options = CategoryOptions {
        income: Vec::new(),
        expense: Vec::new(),
    };

    for category in categories {
        let option = SelectOption::new(category.id, category.name.to_string());

        match category.kind {
            TransactionKind::Income => options.income.push(option),
            TransactionKind::Expense => options.expense.push(option),
        }
    }

    Ok(options)
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS transaction_category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            transaction_count INTEGER NOT NULL DEFAULT 0,
            owner_id INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_owner ON transaction_category(owner_id);",
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let kind = row.get(2)?;
    let icon = row.get(3)?;
    let color = row.get(4)?;
    let transaction_count = row.get(5)?;
    let owner_id = row.get(6)?;

    Ok(Category {
        id,
        name,
        kind,
        icon,
        color,
        transaction_count,
        owner_id,
    })
}


#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::{Error, transaction::TransactionKind};

    use super::{
        CategoryName, NewCategory, category_options, create_category, create_category_table,
        delete_category, get_category, list_categories, update_category,
    };

    const OWNER: i64 = 1;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_category_table(&conn).unwrap();
        conn
    }

    fn new_category(name: &str, kind: TransactionKind) -> NewCategory {
        NewCategory {
            name: CategoryName::new_unchecked(name),
            kind,
            icon: "wallet".to_owned(),
            color: "#abcdef".to_owned(),
        }
    }

    #[test]
    fn create_category_starts_with_zero_count() {
        let conn = get_test_connection();

        let category =
            create_category(new_category("Rent", TransactionKind::Expense), OWNER, &conn).unwrap();

        assert!(category.id > 0);
        assert_eq!(category.transaction_count, 0);
        assert_eq!(category.owner_id, OWNER);
    }

    #[test]
    fn get_category_succeeds() {
        let conn = get_test_connection();
        let inserted =
            create_category(new_category("Rent", TransactionKind::Expense), OWNER, &conn).unwrap();

        let selected = get_category(inserted.id, OWNER, &conn);

        assert_eq!(selected, Ok(inserted));
    }

    #[test]
    fn get_category_of_other_owner_returns_not_found() {
        let conn = get_test_connection();
        let inserted =
            create_category(new_category("Rent", TransactionKind::Expense), OWNER, &conn).unwrap();

        let selected = get_category(inserted.id, OWNER + 1, &conn);

        assert_eq!(selected, Err(Error::NotFound));
    }

    #[test]
    fn list_categories_is_sorted_and_owner_scoped() {
        let conn = get_test_connection();
        create_category(new_category("Zoo", TransactionKind::Expense), OWNER, &conn).unwrap();
        create_category(new_category("Art", TransactionKind::Expense), OWNER, &conn).unwrap();
        create_category(
            new_category("Other", TransactionKind::Expense),
            OWNER + 1,
            &conn,
        )
        .unwrap();

        let categories = list_categories(OWNER, &conn).unwrap();

        let names: Vec<&str> = categories
            .iter()
            .map(|category| category.name.as_ref())
            .collect();
        assert_eq!(names, ["Art", "Zoo"]);
    }

    #[test]
    fn update_category_overwrites_fields() {
        let conn = get_test_connection();
        let inserted =
            create_category(new_category("Rnt", TransactionKind::Expense), OWNER, &conn).unwrap();

        let result = update_category(
            inserted.id,
            OWNER,
            new_category("Rent", TransactionKind::Expense),
            &conn,
        );

        assert_eq!(result, Ok(()));
        let updated = get_category(inserted.id, OWNER, &conn).unwrap();
        assert_eq!(updated.name.as_ref(), "Rent");
    }

    #[test]
    fn update_missing_category_fails() {
        let conn = get_test_connection();

        let result = update_category(
            999999,
            OWNER,
            new_category("Rent", TransactionKind::Expense),
            &conn,
        );

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_category_succeeds() {
        let conn = get_test_connection();
        let inserted =
            create_category(new_category("Rent", TransactionKind::Expense), OWNER, &conn).unwrap();

        let result = delete_category(inserted.id, OWNER, &conn);

        assert_eq!(result, Ok(()));
        assert_eq!(
            get_category(inserted.id, OWNER, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_missing_category_fails() {
        let conn = get_test_connection();

        let result = delete_category(999999, OWNER, &conn);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }

    #[test]
    fn options_are_split_by_kind() {
        let conn = get_test_connection();
        create_category(
            new_category("Salary", TransactionKind::Income),
            OWNER,
            &conn,
        )
        .unwrap();
        create_category(new_category("Rent", TransactionKind::Expense), OWNER, &conn).unwrap();
        create_category(new_category("Food", TransactionKind::Expense), OWNER, &conn).unwrap();

        let options = category_options(OWNER, &conn).unwrap();

        let income_labels: Vec<&str> = options
            .income
            .iter()
            .map(|option| option.label.as_str())
            .collect();
        let expense_labels: Vec<&str> = options
            .expense
            .iter()
            .map(|option| option.label.as_str())
            .collect();
        assert_eq!(income_labels, ["Salary"]);
        assert_eq!(expense_labels, ["Food", "Rent"]);
    }
}
