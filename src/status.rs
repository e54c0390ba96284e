//! The status of a transaction, e.g. whether it has cleared yet.
//!
//! Unlike categories and accounts, statuses are global reference data shared
//! by every user, so rows are not scoped by an owner.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::StatusId, options::SelectOption};

/// A transaction status, e.g. "Completed" or "Pending".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// The ID of the status.
    pub id: StatusId,
    /// The display name of the status.
    pub name: String,
}

/// The statuses inserted when a database is first initialized.
const DEFAULT_STATUSES: [&str; 3] = ["Completed", "Pending", "Canceled"];

/// Retrieve a status from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid status,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_status(id: StatusId, connection: &Connection) -> Result<Status, Error> {
    connection
        .prepare("SELECT id, name FROM transaction_status WHERE id = :id")?
        .query_row(&[(":id", &id)], map_status_row)
        .map_err(|error| error.into())
}

/// Retrieve all statuses, ordered by ID so the seeding order is preserved.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_statuses(connection: &Connection) -> Result<Vec<Status>, Error> {
    connection
        .prepare("SELECT id, name FROM transaction_status ORDER BY id ASC")?
        .query_map([], map_status_row)?
        .map(|maybe_status| maybe_status.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all statuses projected to options for a form dropdown.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn status_options(connection: &Connection) -> Result<Vec<SelectOption>, Error> {
    let statuses = list_statuses(connection)?;

    Ok(statuses
        .into_iter()
        .map(|status| SelectOption::new(status.id, status.name))
        .collect())
}

/// Create the status table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_status_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_status (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
            )",
        (),
    )?;

    Ok(())
}

/// Insert the default statuses if they are not already present.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_default_statuses(connection: &Connection) -> Result<(), rusqlite::Error> {
    for name in DEFAULT_STATUSES {
        connection.execute(
            "INSERT OR IGNORE INTO transaction_status (name) VALUES (?1)",
            (name,),
        )?;
    }

    Ok(())
}

fn map_status_row(row: &Row) -> Result<Status, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;

    Ok(Status { id, name })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{
        DEFAULT_STATUSES, create_status_table, get_status, list_statuses, seed_default_statuses,
        status_options,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_status_table(&conn).unwrap();
        seed_default_statuses(&conn).unwrap();
        conn
    }

    #[test]
    fn seeding_inserts_default_statuses() {
        let conn = get_test_connection();

        let statuses = list_statuses(&conn).unwrap();

        let names: Vec<&str> = statuses.iter().map(|status| status.name.as_str()).collect();
        assert_eq!(names, DEFAULT_STATUSES);
    }

    #[test]
    fn seeding_twice_does_not_duplicate() {
        let conn = get_test_connection();

        seed_default_statuses(&conn).unwrap();

        let statuses = list_statuses(&conn).unwrap();
        assert_eq!(statuses.len(), DEFAULT_STATUSES.len());
    }

    #[test]
    fn get_status_succeeds() {
        let conn = get_test_connection();
        let first = &list_statuses(&conn).unwrap()[0];

        let status = get_status(first.id, &conn).unwrap();

        assert_eq!(&status, first);
    }

    #[test]
    fn get_status_with_invalid_id_returns_not_found() {
        let conn = get_test_connection();

        let status = get_status(999999, &conn);

        assert_eq!(status, Err(Error::NotFound));
    }

    #[test]
    fn options_project_id_and_name() {
        let conn = get_test_connection();

        let options = status_options(&conn).unwrap();

        let statuses = list_statuses(&conn).unwrap();
        assert_eq!(options.len(), statuses.len());
        for (option, status) in options.iter().zip(statuses) {
            assert_eq!(option.value, status.id);
            assert_eq!(option.label, status.name);
            assert_eq!(option.institution, None);
            assert_eq!(option.color, None);
        }
    }
}
