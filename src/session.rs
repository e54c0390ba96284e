//! The signed-in user's session context.
//!
//! A [Session] is constructed on sign-in and torn down on sign-out, and is
//! threaded explicitly through everything the UI does; there is no global
//! session state. It owns the shared database connection and the change
//! notifier, exposes every UI-facing operation as an async method returning
//! plain data structures, and hands out subscription cancel handles for the
//! live views.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use time::Date;

use crate::{
    Error, account, category,
    database_id::{AccountId, CategoryId, OwnerId, TransactionId},
    options::SelectOption,
    reports::{self, DateRange, FinancialOverview, MonthlyTotals},
    status,
    subscription::{ChangeNotifier, Collection, Subscription, spawn_listener},
    transaction::{self, NewTransaction, Transaction, TransactionView},
};

/// The context object for one signed-in user.
///
/// Cheap to clone; clones share the connection and the notifier, so
/// subscribers on one clone observe mutations made through another.
#[derive(Debug, Clone)]
pub struct Session {
    owner_id: OwnerId,
    db_connection: Arc<Mutex<Connection>>,
    notifier: ChangeNotifier,
}

impl Session {
    /// Create the session context for `owner_id` on sign-in.
    pub fn sign_in(db_connection: Arc<Mutex<Connection>>, owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            db_connection,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Tear the session down on sign-out.
    ///
    /// Dropping the session closes its change notifier, which ends every
    /// subscription created from it.
    pub fn sign_out(self) {}

    /// The owner ID scoping every operation on this session.
    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }

    // ========================================================================
    // LEDGER
    // ========================================================================

    /// Record a new transaction and bump the referenced counters.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] for a malformed amount, an
    /// [Error::UnresolvedCategory]/[Error::UnresolvedAccount]/
    /// [Error::UnresolvedStatus] for a reference that does not resolve, or
    /// an [Error::SqlError] if the write fails.
    pub async fn create_transaction(
        &self,
        fields: NewTransaction,
    ) -> Result<Transaction, Error> {
        let created = {
            let connection = self.connection()?;
            transaction::create_transaction(fields, self.owner_id, &connection)?
        };

        self.notifier.publish(Collection::Transactions);
        // The counters on the referenced rows moved too.
        self.notifier.publish(Collection::Categories);
        self.notifier.publish(Collection::Accounts);

        Ok(created)
    }

    /// Overwrite a transaction's fields, moving counters if a reference
    /// changed.
    ///
    /// `previous_category_id` and `previous_account_id` are the references
    /// the record had before the update, as known to the caller.
    ///
    /// # Errors
    /// Returns an [Error::InvalidAmount] for a malformed amount, an
    /// [Error::UpdateMissingTransaction] if `id` does not exist, or an
    /// [Error::SqlError] if the write fails.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        changes: NewTransaction,
        previous_category_id: CategoryId,
        previous_account_id: AccountId,
    ) -> Result<(), Error> {
        let category_changed = changes.category_id != previous_category_id;
        let account_changed = changes.account_id != previous_account_id;

        {
            let connection = self.connection()?;
            transaction::update_transaction(
                id,
                changes,
                previous_category_id,
                previous_account_id,
                &connection,
            )?;
        }

        self.notifier.publish(Collection::Transactions);
        if category_changed {
            self.notifier.publish(Collection::Categories);
        }
        if account_changed {
            self.notifier.publish(Collection::Accounts);
        }

        Ok(())
    }

    /// Delete a transaction and decrement the given counters.
    ///
    /// # Errors
    /// Returns an [Error::DeleteMissingTransaction] if `id` does not
    /// exist, or an [Error::SqlError] if the write fails. A counter
    /// decrement with nowhere to land does not fail the deletion.
    pub async fn delete_transaction(
        &self,
        id: TransactionId,
        category_id: CategoryId,
        account_id: AccountId,
    ) -> Result<(), Error> {
        {
            let connection = self.connection()?;
            transaction::delete_transaction(id, category_id, account_id, &connection)?;
        }

        self.notifier.publish(Collection::Transactions);
        self.notifier.publish(Collection::Categories);
        self.notifier.publish(Collection::Accounts);

        Ok(())
    }

    /// The user's transactions with references resolved, most recent first.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the query fails.
    pub async fn transactions(&self) -> Result<Vec<TransactionView>, Error> {
        let connection = self.connection()?;
        transaction::list_transactions(self.owner_id, &connection)
    }

    /// The user's most recent `limit` transactions with references resolved.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the query fails.
    pub async fn latest_transactions(
        &self,
        limit: u32,
    ) -> Result<Vec<TransactionView>, Error> {
        let connection = self.connection()?;
        transaction::latest_transactions(self.owner_id, limit, &connection)
    }

    // ========================================================================
    // CATEGORIES & ACCOUNTS
    // ========================================================================

    /// Create a category.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the write fails.
    pub async fn create_category(
        &self,
        fields: category::NewCategory,
    ) -> Result<category::Category, Error> {
        let created = {
            let connection = self.connection()?;
            category::create_category(fields, self.owner_id, &connection)?
        };

        self.notifier.publish(Collection::Categories);

        Ok(created)
    }

    /// Overwrite a category's fields.
    ///
    /// # Errors
    /// Returns an [Error::UpdateMissingCategory] if `id` does not refer to
    /// one of the user's categories, or an [Error::SqlError] if the write
    /// fails.
    pub async fn update_category(
        &self,
        id: CategoryId,
        changes: category::NewCategory,
    ) -> Result<(), Error> {
        {
            let connection = self.connection()?;
            category::update_category(id, self.owner_id, changes, &connection)?;
        }

        self.notifier.publish(Collection::Categories);

        Ok(())
    }

    /// Delete a category. Transactions referencing it keep their dangling
    /// reference.
    ///
    /// # Errors
    /// Returns an [Error::DeleteMissingCategory] if `id` does not refer to
    /// one of the user's categories, or an [Error::SqlError] if the write
    /// fails.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), Error> {
        {
            let connection = self.connection()?;
            category::delete_category(id, self.owner_id, &connection)?;
        }

        self.notifier.publish(Collection::Categories);

        Ok(())
    }

    /// The user's categories, ordered by name.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the query fails.
    pub async fn categories(&self) -> Result<Vec<category::Category>, Error> {
        let connection = self.connection()?;
        category::list_categories(self.owner_id, &connection)
    }

    /// Create an account.
    ///
    /// # Errors
    /// Returns an [Error::EmptyAccountName] for a blank name, or an
    /// [Error::SqlError] if the write fails.
    pub async fn create_account(
        &self,
        fields: account::NewAccount,
    ) -> Result<account::Account, Error> {
        let created = {
            let connection = self.connection()?;
            account::create_account(fields, self.owner_id, &connection)?
        };

        self.notifier.publish(Collection::Accounts);

        Ok(created)
    }

    /// Overwrite an account's fields.
    ///
    /// # Errors
    /// Returns an [Error::EmptyAccountName] for a blank name, an
    /// [Error::UpdateMissingAccount] if `id` does not refer to one of the
    /// user's accounts, or an [Error::SqlError] if the write fails.
    pub async fn update_account(
        &self,
        id: AccountId,
        changes: account::NewAccount,
    ) -> Result<(), Error> {
        {
            let connection = self.connection()?;
            account::update_account(id, self.owner_id, changes, &connection)?;
        }

        self.notifier.publish(Collection::Accounts);

        Ok(())
    }

    /// Delete an account. Transactions referencing it keep their dangling
    /// reference.
    ///
    /// # Errors
    /// Returns an [Error::DeleteMissingAccount] if `id` does not refer to
    /// one of the user's accounts, or an [Error::SqlError] if the write
    /// fails.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), Error> {
        {
            let connection = self.connection()?;
            account::delete_account(id, self.owner_id, &connection)?;
        }

        self.notifier.publish(Collection::Accounts);

        Ok(())
    }

    /// The user's accounts, ordered by name.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the query fails.
    pub async fn accounts(&self) -> Result<Vec<account::Account>, Error> {
        let connection = self.connection()?;
        account::list_accounts(self.owner_id, &connection)
    }

    // ========================================================================
    // OPTIONS
    // ========================================================================

    /// The user's categories as form options, split into income and expense
    /// lists.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the query fails.
    pub async fn category_options(&self) -> Result<category::CategoryOptions, Error> {
        let connection = self.connection()?;
        category::category_options(self.owner_id, &connection)
    }

    /// The user's accounts as form options.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the query fails.
    pub async fn account_options(&self) -> Result<Vec<SelectOption>, Error> {
        let connection = self.connection()?;
        account::account_options(self.owner_id, &connection)
    }

    /// The global statuses as form options.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the query fails.
    pub async fn status_options(&self) -> Result<Vec<SelectOption>, Error> {
        let connection = self.connection()?;
        status::status_options(&connection)
    }

    // ========================================================================
    // REPORTS
    // ========================================================================

    /// The overview figures for the user's transactions in `range`.
    ///
    /// Never fails: an empty window and an internal error both produce the
    /// all-zero structure, with the error logged.
    pub async fn financial_overview(&self, range: DateRange) -> FinancialOverview {
        match self.connection() {
            Ok(connection) => reports::compute_overview(self.owner_id, range, &connection),
            Err(error) => {
                tracing::error!("could not compute the financial overview: {error}");
                FinancialOverview::default()
            }
        }
    }

    /// The totals for the calendar month containing `today`.
    ///
    /// Never fails: internal errors are logged and produce the all-zero
    /// structure.
    pub async fn monthly_totals(&self, today: Date) -> MonthlyTotals {
        match self.connection() {
            Ok(connection) => reports::monthly_totals(self.owner_id, today, &connection),
            Err(error) => {
                tracing::error!("could not compute the monthly totals: {error}");
                MonthlyTotals::default()
            }
        }
    }

    // ========================================================================
    // SUBSCRIPTIONS
    // ========================================================================

    /// Observe the user's transaction list.
    ///
    /// The callback receives the current snapshot straight away, then a
    /// fresh snapshot after every ledger mutation, until the returned
    /// handle is cancelled or the session is signed out.
    pub fn subscribe_transactions<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<TransactionView>) + Send + 'static,
    {
        let db_connection = self.db_connection.clone();
        let owner_id = self.owner_id;

        spawn_listener(
            self.notifier.watch(),
            Collection::Transactions,
            move || {
                let connection = db_connection
                    .lock()
                    .map_err(|_| Error::DatabaseLockError)?;
                transaction::list_transactions(owner_id, &connection)
            },
            callback,
        )
    }

    /// Observe the user's category list, including transaction counts.
    pub fn subscribe_categories<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<category::Category>) + Send + 'static,
    {
        let db_connection = self.db_connection.clone();
        let owner_id = self.owner_id;

        spawn_listener(
            self.notifier.watch(),
            Collection::Categories,
            move || {
                let connection = db_connection
                    .lock()
                    .map_err(|_| Error::DatabaseLockError)?;
                category::list_categories(owner_id, &connection)
            },
            callback,
        )
    }

    /// Observe the user's account list, including transaction counts.
    pub fn subscribe_accounts<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<account::Account>) + Send + 'static,
    {
        let db_connection = self.db_connection.clone();
        let owner_id = self.owner_id;

        spawn_listener(
            self.notifier.watch(),
            Collection::Accounts,
            move || {
                let connection = db_connection
                    .lock()
                    .map_err(|_| Error::DatabaseLockError)?;
                account::list_accounts(owner_id, &connection)
            },
            callback,
        )
    }
}
