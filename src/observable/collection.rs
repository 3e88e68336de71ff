//! Lazily refreshed, ordered collection derived from an external producer.

use super::subscribers::{Subscribers, SubscriptionId};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::debug;

/// Zero-argument source of items.
pub type Producer<T> = Box<dyn Fn() -> BoxFuture<'static, Vec<T>> + Send + Sync>;

/// Total order used to normalize items after each refresh.
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Ordered, deduplicated sequence recomputed only on `refresh()`.
///
/// Reads return the snapshot produced by the most recent refresh. Each refresh
/// swaps the whole sequence in one step and fires exactly one notification.
/// When refreshes overlap, a refresh that started earlier than the one already
/// applied is discarded without notifying, so subscribers never end on a stale
/// list.
pub struct LazyCollection<T> {
    producer: Producer<T>,
    comparator: Comparator<T>,
    items: RwLock<Arc<Vec<T>>>,
    issued: AtomicU64,
    applied: Mutex<u64>,
    changed: Subscribers<Arc<Vec<T>>>,
}

impl<T> LazyCollection<T>
where
    T: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub fn new<C>(producer: Producer<T>, comparator: C) -> Self
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self {
            producer,
            comparator: Box::new(comparator),
            items: RwLock::new(Arc::new(Vec::new())),
            issued: AtomicU64::new(0),
            applied: Mutex::new(0),
            changed: Subscribers::new(),
        }
    }

    /// Build from a synchronous producer.
    pub fn from_fn<F, C>(producer: F, comparator: C) -> Self
    where
        F: Fn() -> Vec<T> + Send + Sync + 'static,
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self::new(
            Box::new(move || futures::future::ready(producer()).boxed()),
            comparator,
        )
    }

    /// Snapshot from the last refresh (empty before the first one).
    pub fn items(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items.read())
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.read().contains(item)
    }

    /// Re-run the producer, normalize, swap, and notify once.
    ///
    /// Returns the current snapshot, which is newer than this refresh's own
    /// result if a later refresh has already been applied.
    pub async fn refresh(&self) -> Arc<Vec<T>> {
        let ticket = self.issued.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let produced = (self.producer)().await;
        let items = Arc::new(normalize(produced, &self.comparator));

        let mut applied = self.applied.lock();
        if ticket < *applied {
            debug!(ticket, applied = *applied, "Discarding superseded refresh");
            return self.items();
        }
        *applied = ticket;
        *self.items.write() = Arc::clone(&items);
        debug!(count = items.len(), "Collection refreshed");
        self.changed.notify(&items);
        items
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Arc<Vec<T>>) + Send + Sync + 'static,
    {
        self.changed.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }
}

/// Drop repeated items (first occurrence wins), then stable-sort.
fn normalize<T, C>(mut items: Vec<T>, comparator: &C) -> Vec<T>
where
    T: Clone + Eq + Hash,
    C: Fn(&T, &T) -> Ordering + ?Sized,
{
    let mut seen = HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.clone()));
    items.sort_by(|a, b| comparator(a, b));
    items
}

/// Ordinal, case-insensitive string ordering.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
