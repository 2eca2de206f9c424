// ── Query cache ──
//
// Keyed, shared, sequence-checked fetch state. A key is created on first
// subscription, fetched immediately, optionally polled while subscribed,
// and observed through a `watch` channel.

mod entry;
mod state;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::future::BoxFuture;
use tokio::sync::watch;

use crate::error::CoreError;

use self::entry::QueryEntry;
pub use self::state::{QueryState, QueryStatus, QueryView, StalePolicy};

/// Produces one fetch of a query's value.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher<T, F, Fut>(f: F) -> Fetcher<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

// ── Keys ─────────────────────────────────────────────────────────────

/// Identity of a cached query: resource path plus parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    path: String,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter. Parameters are kept sorted so insertion order
    /// doesn't affect identity.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self.params.sort();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}

// ── Subscribe options ────────────────────────────────────────────────

/// Per-subscriber options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Poll while this subscription is alive.
    pub poll_interval: Option<Duration>,
    /// Fetch even when the key already has state.
    pub refetch_on_subscribe: bool,
}

impl SubscribeOptions {
    pub fn polling(interval: Duration) -> Self {
        Self {
            poll_interval: Some(interval),
            ..Self::default()
        }
    }

    pub fn refetch_on_subscribe(mut self) -> Self {
        self.refetch_on_subscribe = true;
        self
    }
}

// ── Cache ────────────────────────────────────────────────────────────

/// All cached keys for one value type.
pub struct QueryCache<T> {
    entries: DashMap<QueryKey, Arc<QueryEntry<T>>>,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T: Send + Sync + 'static> QueryCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `key`, creating it with `fetcher` if it is new.
    ///
    /// A fetch is issued when the key is created, when it had no live
    /// subscribers, or when `options.refetch_on_subscribe` is set. An
    /// existing key keeps its original fetcher.
    pub fn subscribe(
        &self,
        key: QueryKey,
        fetcher: Fetcher<T>,
        options: SubscribeOptions,
    ) -> QuerySubscription<T> {
        let entry = match self.entries.entry(key) {
            Entry::Occupied(occupied) => Arc::clone(occupied.get()),
            Entry::Vacant(vacant) => {
                let entry = Arc::new(QueryEntry::new(vacant.key().clone(), fetcher));
                vacant.insert(Arc::clone(&entry));
                entry
            }
        };

        let receiver = entry.state.subscribe();
        let (id, was_unused) = entry.add_subscriber(options.poll_interval);
        if was_unused || options.refetch_on_subscribe {
            entry.spawn_fetch();
        }

        QuerySubscription {
            entry,
            id,
            receiver,
        }
    }

    /// Snapshot of a key's state, if it exists.
    pub fn get(&self, key: &QueryKey) -> Option<QueryState<T>> {
        self.entries.get(key).map(|e| e.state.borrow().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget keys nobody is subscribed to. Returns how many were dropped.
    pub fn prune_unused(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.subscriber_count() > 0);
        before - self.entries.len()
    }
}

// ── Subscription ─────────────────────────────────────────────────────

/// A live interest in one query key. Dropping it unsubscribes, which
/// stops polling once no subscriber is left.
pub struct QuerySubscription<T: Send + Sync + 'static> {
    entry: Arc<QueryEntry<T>>,
    id: u64,
    receiver: watch::Receiver<QueryState<T>>,
}

impl<T: Send + Sync + 'static> QuerySubscription<T> {
    pub fn key(&self) -> &QueryKey {
        &self.entry.key
    }

    pub fn current(&self) -> QueryState<T> {
        self.receiver.borrow().clone()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.receiver.borrow().data.clone()
    }

    /// Wait for the next committed change. `None` if the cache is gone.
    pub async fn changed(&mut self) -> Option<QueryState<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait until no fetch is in flight and return the settled state.
    pub async fn settled(&mut self) -> QueryState<T> {
        if let Ok(state) = self.receiver.wait_for(|s| !s.is_fetching()).await {
            return state.clone();
        }
        self.current()
    }

    /// Fetch now and restart the poll period.
    pub fn refetch(&self) {
        self.entry.refetch();
    }

    pub fn view(&self, policy: StalePolicy, check_fetching: bool) -> QueryView<T> {
        self.receiver.borrow().view(policy, check_fetching)
    }

    /// A fresh receiver for callers that want to drive their own loop.
    pub fn watch(&self) -> watch::Receiver<QueryState<T>> {
        self.receiver.clone()
    }
}

impl<T: Send + Sync + 'static> Drop for QuerySubscription<T> {
    fn drop(&mut self) {
        self.entry.remove_subscriber(self.id);
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for QuerySubscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("key", &self.entry.key)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use pretty_assertions::assert_eq;
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    use super::*;

    fn counting_fetcher(calls: Arc<AtomicU32>) -> Fetcher<u32> {
        fetcher(move || {
            let calls = Arc::clone(&calls);
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) }
        })
    }

    /// Let spawned tasks run to their next await point.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn key_display_and_param_order() {
        let a = QueryKey::new("/files/list")
            .with_param("path", "trips")
            .with_param("depth", "1");
        let b = QueryKey::new("/files/list")
            .with_param("depth", "1")
            .with_param("path", "trips");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "/files/list?depth=1&path=trips");
    }

    #[tokio::test(start_paused = true)]
    async fn first_subscription_fetches_and_second_shares() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));

        let mut first = cache.subscribe(
            QueryKey::new("/inverter"),
            counting_fetcher(Arc::clone(&calls)),
            SubscribeOptions::default(),
        );
        let state = first.settled().await;
        assert_eq!(state.data.as_deref(), Some(&1));

        let second = cache.subscribe(
            QueryKey::new("/inverter"),
            counting_fetcher(Arc::clone(&calls)),
            SubscribeOptions::default(),
        );
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.data().as_deref(), Some(&1));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refetch_on_subscribe_forces_fetch() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));
        let key = QueryKey::new("/inverter");

        let mut first = cache.subscribe(
            key.clone(),
            counting_fetcher(Arc::clone(&calls)),
            SubscribeOptions::default(),
        );
        first.settled().await;

        let mut second = cache.subscribe(
            key,
            counting_fetcher(Arc::clone(&calls)),
            SubscribeOptions::default().refetch_on_subscribe(),
        );
        let state = second.settled().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.data.as_deref(), Some(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_from_older_fetch_is_discarded() {
        let cache = QueryCache::new();
        let senders: Arc<Mutex<Vec<oneshot::Sender<u32>>>> = Arc::default();

        let pending = Arc::clone(&senders);
        let gated = fetcher(move || {
            let (tx, rx) = oneshot::channel();
            pending.lock().unwrap().push(tx);
            async move {
                rx.await.map_err(|_| CoreError::Internal("dropped".into()))
            }
        });

        let mut sub = cache.subscribe(QueryKey::new("/leds"), gated, SubscribeOptions::default());
        sub.refetch();
        settle().await;

        let (a, b) = {
            let mut guard = senders.lock().unwrap();
            let b = guard.pop().unwrap();
            let a = guard.pop().unwrap();
            (a, b)
        };
        b.send(20).unwrap();
        settle().await;
        a.send(10).unwrap();
        settle().await;

        let state = sub.current();
        assert_eq!(state.data.as_deref(), Some(&20));
        assert!(!state.is_fetching());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refetch_keeps_data() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let flaky = fetcher(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(42_u32)
                } else {
                    Err(CoreError::Transport {
                        message: "sensor offline".into(),
                    })
                }
            }
        });

        let mut sub = cache.subscribe(
            QueryKey::new("/smartshunt/data"),
            flaky,
            SubscribeOptions::default(),
        );
        sub.settled().await;
        sub.refetch();
        let state = sub.settled().await;

        assert_eq!(state.status, QueryStatus::Error);
        assert_eq!(state.data.as_deref(), Some(&42));
        assert!(state.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn polls_while_subscribed_and_stops_after_drop() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));

        let sub = cache.subscribe(
            QueryKey::new("/level_sensor/data"),
            counting_fetcher(Arc::clone(&calls)),
            SubscribeOptions::polling(Duration::from_secs(15)),
        );
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(15_001)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        sleep(Duration::from_secs(15)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(sub);
        sleep(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        assert_eq!(cache.prune_unused(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn fastest_subscriber_sets_the_period() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));
        let key = QueryKey::new("/smartshunt/data");

        let _slow = cache.subscribe(
            key.clone(),
            counting_fetcher(Arc::clone(&calls)),
            SubscribeOptions::polling(Duration::from_secs(60)),
        );
        let fast = cache.subscribe(
            key,
            counting_fetcher(Arc::clone(&calls)),
            SubscribeOptions::polling(Duration::from_secs(10)),
        );
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        sleep(Duration::from_millis(10_001)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Back to the slow period once the fast subscriber leaves.
        drop(fast);
        sleep(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refetch_resets_poll_timer() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicU32::new(0));

        let sub = cache.subscribe(
            QueryKey::new("/level_sensor/data"),
            counting_fetcher(Arc::clone(&calls)),
            SubscribeOptions::polling(Duration::from_secs(15)),
        );
        settle().await;

        sleep(Duration::from_secs(10)).await;
        sub.refetch();
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // The original t=15s tick no longer happens.
        sleep(Duration::from_secs(6)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        sleep(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
