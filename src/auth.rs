//! The signed-in/signed-out signal from the authentication collaborator.
//!
//! Authentication itself happens outside this crate. [AuthState] models the
//! one thing the core consumes from it: the current owner ID while signed
//! in, and a change signal around sign-in/sign-out that the app uses to
//! construct and tear down a [crate::Session].

use tokio::sync::watch;

use crate::{database_id::OwnerId, subscription::Subscription};

/// The authentication signal: who is signed in, if anyone.
#[derive(Debug)]
pub struct AuthState {
    sender: watch::Sender<Option<OwnerId>>,
}

impl AuthState {
    /// Create the signal in the signed-out state.
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Record that `owner_id` signed in and notify observers.
    pub fn sign_in(&self, owner_id: OwnerId) {
        self.sender.send_replace(Some(owner_id));
    }

    /// Record that the user signed out and notify observers.
    pub fn sign_out(&self) {
        self.sender.send_replace(None);
    }

    /// The owner ID of the signed-in user, or `None` when signed out.
    pub fn current_user(&self) -> Option<OwnerId> {
        *self.sender.borrow()
    }

    /// Observe sign-in/sign-out changes.
    ///
    /// The callback receives the current state straight away, then every
    /// subsequent change, until the returned handle is cancelled.
    pub fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<OwnerId>) + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();

        let task = tokio::spawn(async move {
            callback(*receiver.borrow_and_update());

            while receiver.changed().await.is_ok() {
                callback(*receiver.borrow_and_update());
            }
        });

        Subscription::new(task)
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}
