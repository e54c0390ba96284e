//! Display-friendly projections of referenced entities.
//!
//! A transaction stores bare category/account/status IDs. The UI wants a
//! `{value, label}` pair it can feed straight into a select input or a list
//! row, so each reference is resolved here into a [SelectOption]. Resolution
//! of a reference whose target has since been deleted yields `None`; callers
//! must treat that as "unknown/deleted", never as an error.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error, account, category,
    database_id::{AccountId, CategoryId, DatabaseId, OwnerId, StatusId},
    status,
};

/// A denormalized view of a referenced entity for display purposes.
///
/// Never persisted; built on demand from the referenced row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    /// The ID of the referenced entity.
    pub value: DatabaseId,
    /// The display name of the referenced entity.
    pub label: String,
    /// The institution holding the account, for account options only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    /// The display color, for account options only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SelectOption {
    /// Create an option carrying only a value and a label.
    pub fn new(value: DatabaseId, label: String) -> Self {
        Self {
            value,
            label,
            institution: None,
            color: None,
        }
    }
}

/// Resolve a transaction's category reference to an option.
///
/// Returns `Ok(None)` if the category was deleted since the transaction was
/// written, or if it belongs to another owner.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn resolve_category(
    id: CategoryId,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Option<SelectOption>, Error> {
    match category::get_category(id, owner_id, connection) {
        Ok(category) => Ok(Some(SelectOption::new(
            category.id,
            category.name.to_string(),
        ))),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Resolve a transaction's account reference to an option.
///
/// Account options carry the institution and color so the UI can render the
/// account chip without a second lookup. Returns `Ok(None)` for a dangling
/// or foreign-owned reference.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn resolve_account(
    id: AccountId,
    owner_id: OwnerId,
    connection: &Connection,
) -> Result<Option<SelectOption>, Error> {
    match account::get_account(id, owner_id, connection) {
        Ok(account) => Ok(Some(SelectOption {
            value: account.id,
            label: account.name,
            institution: Some(account.institution),
            color: Some(account.color),
        })),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}

/// Resolve a transaction's status reference to an option.
///
/// Returns `Ok(None)` for a dangling reference.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn resolve_status(
    id: StatusId,
    connection: &Connection,
) -> Result<Option<SelectOption>, Error> {
    match status::get_status(id, connection) {
        Ok(status) => Ok(Some(SelectOption::new(status.id, status.name))),
        Err(Error::NotFound) => Ok(None),
        Err(error) => Err(error),
    }
}
