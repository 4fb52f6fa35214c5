//! Push-on-change query results.
//!
//! A [`LiveQuery`] receives the result of its query once on subscription and
//! again after every committed write that changes that result. The
//! [`ChangeHub`] owned by the database keeps one refresh closure per live
//! query. After each commit it loads the catalog once and hands that snapshot
//! to every closure; results equal to the last pushed value are not sent
//! again. Each subscriber holds at most one unread value, the newest.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError, TrySendError};
use log::{debug, warn};

use crate::app_response::AppResponse;
use crate::clothing_item::ClothingItem;

type Refresh = Box<dyn FnMut(&[ClothingItem]) -> bool + Send>;

struct Subscription {
    id: u64,
    refresh: Refresh,
}

/// Registry of live queries attached to one database.
#[derive(Default)]
pub struct ChangeHub {
    next_id: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl std::fmt::Debug for ChangeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeHub")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ChangeHub {
    fn lock(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Registers `derive` and delivers its first result.
    ///
    /// The snapshot is loaded under the registry lock, so a write that
    /// commits concurrently is either part of it or triggers a refresh
    /// afterwards.
    pub(crate) fn subscribe<T, L, F>(hub: &Arc<ChangeHub>, load: L, derive: F) -> Result<LiveQuery<T>, AppResponse>
    where
        T: Clone + PartialEq + Send + 'static,
        L: FnOnce() -> Result<Vec<ClothingItem>, AppResponse>,
        F: Fn(&[ClothingItem]) -> T + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        let mut subscriptions = hub.lock();

        let initial = derive(&load()?);
        // The channel is empty and the receiver is in scope.
        let _ = tx.try_send(initial.clone());

        let id = hub.next_id.fetch_add(1, Ordering::Relaxed);
        subscriptions.push(Subscription {
            id,
            refresh: refresher(derive, tx, rx.clone(), initial),
        });
        debug!("Live query {id} subscribed ({} active)", subscriptions.len());

        Ok(LiveQuery {
            id,
            rx,
            hub: Arc::downgrade(hub),
        })
    }

    /// Loads the catalog once and re-evaluates every live query against it.
    /// Does nothing when there are no subscribers.
    pub(crate) fn publish(&self, load: impl FnOnce() -> Result<Vec<ClothingItem>, AppResponse>) {
        let mut subscriptions = self.lock();
        if subscriptions.is_empty() {
            return;
        }
        let items = match load() {
            Ok(items) => items,
            Err(e) => {
                // Subscribers stay registered; the next commit retries.
                warn!("Failed to load catalog for live queries: {e}");
                return;
            }
        };
        subscriptions.retain_mut(|sub| (sub.refresh)(&items));
    }

    /// Drops every subscription. Pending `recv` calls return an error.
    pub(crate) fn close(&self) {
        let dropped = std::mem::take(&mut *self.lock());
        debug!("Closed {} live queries", dropped.len());
    }

    fn unsubscribe(&self, id: u64) {
        let mut subscriptions = self.lock();
        subscriptions.retain(|sub| sub.id != id);
        debug!("Live query {id} dropped ({} active)", subscriptions.len());
    }
}

/// Builds the refresh closure. `stale` is a second handle on the subscriber's
/// channel, used to discard an unread value before pushing a newer one.
fn refresher<T, F>(derive: F, tx: Sender<T>, stale: Receiver<T>, initial: T) -> Refresh
where
    T: Clone + PartialEq + Send + 'static,
    F: Fn(&[ClothingItem]) -> T + Send + 'static,
{
    let mut last = initial;
    Box::new(move |items: &[ClothingItem]| {
        let next = derive(items);
        if next == last {
            return true;
        }
        last = next.clone();
        let mut value = next;
        loop {
            match tx.try_send(value) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    let _ = stale.try_recv();
                    value = back;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    })
}

/// Observable result of a query.
///
/// Only the newest unread value is kept; a value nobody read is replaced by
/// the next one. Dropping the handle unsubscribes it.
pub struct LiveQuery<T> {
    id: u64,
    rx: Receiver<T>,
    hub: Weak<ChangeHub>,
}

impl<T> std::fmt::Debug for LiveQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("id", &self.id)
            .field("pending", &self.rx.len())
            .finish()
    }
}

impl<T> LiveQuery<T> {
    /// Blocks until the next value is pushed.
    pub fn recv(&self) -> Result<T, AppResponse> {
        self.rx
            .recv()
            .map_err(|_| AppResponse::DatabaseError("Database was closed".to_string()))
    }

    /// Waits up to `timeout` for the next value. `Ok(None)` on timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>, AppResponse> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Ok(Some(value)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(AppResponse::DatabaseError("Database was closed".to_string()))
            }
        }
    }

    /// Next buffered value, without blocking.
    pub fn try_recv(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Newest unread value, if any.
    pub fn latest(&self) -> Option<T> {
        self.rx.try_iter().last()
    }

    /// Number of unread values, never more than one.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}
