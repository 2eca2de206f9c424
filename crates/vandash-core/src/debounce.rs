// ── Debounce scheduler ──
//
// One pending timer per debouncer. Every `schedule` aborts the previous
// timer task and bumps a generation counter; a woken task only fires if
// its generation is still current, so an abort that loses the race with
// the timer can't produce a second fire.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

type OnFire<V> = Box<dyn Fn(V) + Send + Sync>;

/// Trailing-edge debouncer delivering the latest scheduled value.
pub struct Debouncer<V> {
    inner: Arc<Inner<V>>,
}

struct Inner<V> {
    delay: Duration,
    on_fire: OnFire<V>,
    pending: Mutex<Pending<V>>,
}

struct Pending<V> {
    generation: u64,
    handle: Option<JoinHandle<()>>,
    skip_initial: Option<V>,
}

impl<V> Inner<V> {
    fn pending(&self) -> MutexGuard<'_, Pending<V>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: PartialEq + Send + 'static> Debouncer<V> {
    pub fn new(delay: Duration, on_fire: impl Fn(V) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                delay,
                on_fire: Box::new(on_fire),
                pending: Mutex::new(Pending {
                    generation: 0,
                    handle: None,
                    skip_initial: None,
                }),
            }),
        }
    }

    /// A debouncer that ignores a first `schedule` equal to `initial`.
    pub fn primed(
        delay: Duration,
        initial: V,
        on_fire: impl Fn(V) + Send + Sync + 'static,
    ) -> Self {
        let debouncer = Self::new(delay, on_fire);
        debouncer.prime(initial);
        debouncer
    }

    /// Arm the skip-initial check with the just-loaded value.
    pub fn prime(&self, initial: V) {
        self.inner.pending().skip_initial = Some(initial);
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// (Re)start the timer with `value`. Returns `false` when the value was
    /// swallowed by the skip-initial check.
    pub fn schedule(&self, value: V) -> bool {
        let mut pending = self.inner.pending();
        if let Some(initial) = pending.skip_initial.take() {
            if initial == value {
                trace!("debounce: skipping initial value");
                return false;
            }
        }

        pending.generation += 1;
        let generation = pending.generation;
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }

        let deadline = Instant::now() + self.inner.delay;
        let inner = Arc::clone(&self.inner);
        pending.handle = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let current = {
                let mut pending = inner.pending();
                let current = pending.generation == generation;
                if current {
                    pending.handle = None;
                }
                current
            };
            if current {
                (inner.on_fire)(value);
            }
        }));
        true
    }

    /// Drop any pending timer without firing.
    pub fn cancel(&self) {
        let mut pending = self.inner.pending();
        pending.generation += 1;
        if let Some(handle) = pending.handle.take() {
            trace!("debounce: cancelled pending timer");
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending().handle.is_some()
    }
}

impl<V> Drop for Debouncer<V> {
    fn drop(&mut self) {
        let mut pending = self.inner.pending();
        pending.generation += 1;
        if let Some(handle) = pending.handle.take() {
            handle.abort();
        }
    }
}

impl<V> fmt::Debug for Debouncer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.inner.delay)
            .finish_non_exhaustive()
    }
}
