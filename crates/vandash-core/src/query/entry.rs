// ── One cached query key ──
//
// Owns the watch channel, the sequence counter, the subscriber table and
// the poll task for a single key. The poll period is the minimum requested
// by live subscribers; the task is rebuilt whenever that minimum changes
// and cancelled when the last subscriber leaves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Notify, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::state::QueryState;
use super::{Fetcher, QueryKey};

pub(crate) struct QueryEntry<T> {
    pub(crate) key: QueryKey,
    fetcher: Fetcher<T>,
    pub(crate) state: watch::Sender<QueryState<T>>,
    next_seq: AtomicU64,
    subscribers: Mutex<Subscribers>,
    poll_reset: Notify,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    intervals: HashMap<u64, Option<Duration>>,
    poller: Option<Poller>,
}

struct Poller {
    period: Duration,
    cancel: CancellationToken,
}

impl<T: Send + Sync + 'static> QueryEntry<T> {
    pub(crate) fn new(key: QueryKey, fetcher: Fetcher<T>) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            key,
            fetcher,
            state,
            next_seq: AtomicU64::new(0),
            subscribers: Mutex::new(Subscribers::default()),
            poll_reset: Notify::new(),
        }
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers().intervals.len()
    }

    /// Register a subscriber. Returns its id and whether the key had no
    /// subscribers before.
    pub(crate) fn add_subscriber(self: &Arc<Self>, poll: Option<Duration>) -> (u64, bool) {
        let mut subs = self.subscribers();
        let was_unused = subs.intervals.is_empty();
        subs.next_id += 1;
        let id = subs.next_id;
        subs.intervals.insert(id, poll);
        self.reconcile_poller(&mut subs);
        (id, was_unused)
    }

    pub(crate) fn remove_subscriber(self: &Arc<Self>, id: u64) {
        let mut subs = self.subscribers();
        subs.intervals.remove(&id);
        self.reconcile_poller(&mut subs);
    }

    fn reconcile_poller(self: &Arc<Self>, subs: &mut Subscribers) {
        let wanted = subs.intervals.values().flatten().min().copied();
        if let (Some(poller), Some(period)) = (&subs.poller, wanted) {
            if poller.period == period {
                return;
            }
        }

        if let Some(old) = subs.poller.take() {
            debug!(key = %self.key, period = ?old.period, "stopping poll task");
            old.cancel.cancel();
        }

        let Some(period) = wanted else {
            return;
        };
        // Subscriptions dropped outside a runtime just stop polling.
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        let cancel = CancellationToken::new();
        debug!(key = %self.key, ?period, "starting poll task");
        tokio::spawn(poll_task(Arc::clone(self), period, cancel.clone()));
        subs.poller = Some(Poller { period, cancel });
    }

    /// Issue a fetch tagged with the next sequence number.
    pub(crate) fn spawn_fetch(self: &Arc<Self>) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.begin(seq));
        debug!(key = %self.key, seq, "fetch issued");

        let fut = (self.fetcher)();
        let entry = Arc::clone(self);
        tokio::spawn(async move {
            let result = fut.await;
            if let Err(ref e) = result {
                warn!(key = %entry.key, seq, error = %e, "fetch failed");
            }
            let committed = entry
                .state
                .send_if_modified(|s| s.commit(seq, result, Utc::now()));
            if !committed {
                debug!(key = %entry.key, seq, "discarding stale fetch result");
            }
        });
    }

    /// Out-of-band fetch that also restarts the poll period.
    pub(crate) fn refetch(self: &Arc<Self>) {
        self.spawn_fetch();
        self.poll_reset.notify_one();
    }
}

async fn poll_task<T: Send + Sync + 'static>(
    entry: Arc<QueryEntry<T>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = entry.poll_reset.notified() => interval.reset(),
            _ = interval.tick() => entry.spawn_fetch(),
        }
    }

    debug!(key = %entry.key, "poll task exited");
}
