//! Live change notifications for ledger observers.
//!
//! Every successful mutation publishes an event naming the collections it
//! touched; each subscription listens for events on its collection,
//! re-queries its snapshot, and pushes the result to the observer callback.
//! Events for a single subscription are delivered in the order they were
//! published; nothing is guaranteed across independent subscriptions.

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

use crate::Error;

/// How many change events may queue up for a slow listener before it lags.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// The logical collections observers can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// The transaction ledger.
    Transactions,
    /// The user's categories, including their transaction counts.
    Categories,
    /// The user's accounts, including their transaction counts.
    Accounts,
}

/// Fans change events out to the listener tasks behind the session's
/// subscriptions.
///
/// Dropping the last notifier closes the channel, which ends every
/// listener task; this is how signing out tears down outstanding
/// subscriptions.
#[derive(Debug, Clone)]
pub(crate) struct ChangeNotifier {
    sender: broadcast::Sender<Collection>,
}

impl ChangeNotifier {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Announce that `collection` changed. Having no listeners is fine.
    pub(crate) fn publish(&self, collection: Collection) {
        let _ = self.sender.send(collection);
    }

    pub(crate) fn watch(&self) -> broadcast::Receiver<Collection> {
        self.sender.subscribe()
    }
}

/// The cancel handle for a live subscription.
///
/// Returned by the session's `subscribe_*` methods. Calling
/// [Subscription::unsubscribe] stops updates and releases the underlying
/// listener; it consumes the handle, so it can be invoked at most once.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// Stop receiving updates and release the underlying listener.
    pub fn unsubscribe(self) {
        self.task.abort();
    }
}

/// Spawn the listener task backing one subscription.
///
/// The observer receives an initial snapshot straight away, then a fresh
/// snapshot after every event matching `collection`, until the handle is
/// cancelled or the notifier closes.
pub(crate) fn spawn_listener<T, Q, F>(
    mut events: broadcast::Receiver<Collection>,
    collection: Collection,
    query: Q,
    callback: F,
) -> Subscription
where
    T: Send + 'static,
    Q: Fn() -> Result<T, Error> + Send + 'static,
    F: Fn(T) + Send + 'static,
{
    let task = tokio::spawn(async move {
        push_snapshot(&query, &callback);

        loop {
            match events.recv().await {
                Ok(changed) if changed == collection => push_snapshot(&query, &callback),
                Ok(_) => {}
                // Missed events collapse into a single refresh.
                Err(RecvError::Lagged(_)) => push_snapshot(&query, &callback),
                Err(RecvError::Closed) => break,
            }
        }
    });

    Subscription::new(task)
}

/// Re-query and push one snapshot to the observer.
///
/// A failed query is logged and the callback is not invoked, so observers
/// keep their last-known data rather than blanking out.
fn push_snapshot<T, Q, F>(query: &Q, callback: &F)
where
    Q: Fn() -> Result<T, Error>,
    F: Fn(T),
{
    match query() {
        Ok(snapshot) => callback(snapshot),
        Err(error) => tracing::error!("could not refresh a live subscription: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicI64, Ordering},
        },
        time::Duration,
    };

    use tokio::{sync::mpsc, time::timeout};

    use super::{ChangeNotifier, Collection, spawn_listener};

    const RECV_TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn listener_pushes_an_initial_snapshot() {
        let notifier = ChangeNotifier::new();
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let subscription = spawn_listener(
            notifier.watch(),
            Collection::Transactions,
            || Ok(7),
            move |snapshot| {
                sender.send(snapshot).unwrap();
            },
        );

        let snapshot = timeout(RECV_TIMEOUT, receiver.recv()).await.unwrap();
        assert_eq!(snapshot, Some(7));

        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn listener_pushes_a_snapshot_per_matching_event() {
        let notifier = ChangeNotifier::new();
        let version = Arc::new(AtomicI64::new(0));
        let query_version = version.clone();
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let subscription = spawn_listener(
            notifier.watch(),
            Collection::Categories,
            move || Ok(query_version.load(Ordering::SeqCst)),
            move |snapshot| {
                sender.send(snapshot).unwrap();
            },
        );

        assert_eq!(timeout(RECV_TIMEOUT, receiver.recv()).await.unwrap(), Some(0));

        version.store(1, Ordering::SeqCst);
        notifier.publish(Collection::Categories);

        assert_eq!(timeout(RECV_TIMEOUT, receiver.recv()).await.unwrap(), Some(1));

        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn listener_ignores_events_for_other_collections() {
        let notifier = ChangeNotifier::new();
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let subscription = spawn_listener(
            notifier.watch(),
            Collection::Transactions,
            || Ok(()),
            move |snapshot| {
                sender.send(snapshot).unwrap();
            },
        );

        // Initial snapshot.
        assert!(timeout(RECV_TIMEOUT, receiver.recv()).await.unwrap().is_some());

        notifier.publish(Collection::Accounts);

        let unexpected = timeout(Duration::from_millis(100), receiver.recv()).await;
        assert!(unexpected.is_err(), "got a snapshot for an unwatched collection");

        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn unsubscribing_stops_updates() {
        let notifier = ChangeNotifier::new();
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let subscription = spawn_listener(
            notifier.watch(),
            Collection::Transactions,
            || Ok(()),
            move |snapshot| {
                let _ = sender.send(snapshot);
            },
        );

        assert!(timeout(RECV_TIMEOUT, receiver.recv()).await.unwrap().is_some());

        subscription.unsubscribe();
        notifier.publish(Collection::Transactions);

        let unexpected = timeout(Duration::from_millis(100), receiver.recv()).await;
        match unexpected {
            // The sender is dropped when the aborted task unwinds, so the
            // channel either closes or stays silent.
            Ok(None) | Err(_) => {}
            Ok(Some(_)) => panic!("got a snapshot after unsubscribing"),
        }
    }
}
