//! Fintrack is the ledger core of a personal finance tracking web app.
//!
//! Users record income and expense transactions against categories and
//! accounts, and view aggregated reports. This library owns the parts with
//! real invariants: the transaction ledger, the per-category and per-account
//! transaction counters kept in sync with ledger mutations, report
//! aggregation over a date range, and live change subscriptions. The UI and
//! the authentication flow are external collaborators that consume the plain
//! data structures and subscription handles exposed here.

#![warn(missing_docs)]

mod account;
mod auth;
mod category;
mod counter;
mod database_id;
mod db;
mod options;
mod reports;
mod session;
mod status;
mod subscription;
mod transaction;

pub use account::{Account, NewAccount};
pub use auth::AuthState;
pub use category::{Category, CategoryName, CategoryOptions, NewCategory};
pub use database_id::{AccountId, CategoryId, DatabaseId, OwnerId, StatusId, TransactionId};
pub use db::initialize as initialize_db;
pub use options::SelectOption;
pub use reports::{DateRange, FinancialOverview, LargestExpense, MonthlyTotals, TimePeriod};
pub use session::Session;
pub use status::Status;
pub use subscription::{Collection, Subscription};
pub use transaction::{NewTransaction, Transaction, TransactionKind, TransactionView};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A string other than "income" or "expense" was used as a transaction
    /// kind.
    #[error("{0:?} is not a valid transaction kind, expected \"income\" or \"expense\"")]
    InvalidTransactionKind(String),

    /// A transaction amount was not a finite, non-negative number.
    ///
    /// Amounts are stored unsigned; whether money came in or went out is
    /// derived from the transaction kind, so negative amounts are rejected.
    #[error("{0} is not a valid amount, expected a finite, non-negative number")]
    InvalidAmount(f64),

    /// An empty string was used for a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used for an account name.
    #[error("Account name cannot be empty")]
    EmptyAccountName,

    /// The category ID on a new transaction did not resolve to a category
    /// owned by the same user.
    #[error("the category ID {0} does not refer to a valid category")]
    UnresolvedCategory(CategoryId),

    /// The account ID on a new transaction did not resolve to an account
    /// owned by the same user.
    #[error("the account ID {0} does not refer to a valid account")]
    UnresolvedAccount(AccountId),

    /// The status ID on a new transaction did not resolve to a known status.
    #[error("the status ID {0} does not refer to a valid status")]
    UnresolvedStatus(StatusId),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
