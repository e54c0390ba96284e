//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a transaction record.
pub type TransactionId = DatabaseId;

/// The ID of a transaction category.
pub type CategoryId = DatabaseId;

/// The ID of a transaction account.
pub type AccountId = DatabaseId;

/// The ID of a transaction status.
pub type StatusId = DatabaseId;

/// The user identifier scoping all queries and writes.
pub type OwnerId = DatabaseId;
