// ── Toast notifications ──
//
// Single-slot notification state. `show` replaces whatever is visible and
// restarts the expiry timer; the timer clears the slot only if no newer
// toast has been shown since it was armed.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToastStatus {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

/// The visible toast, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToastState {
    pub message: Option<String>,
    pub status: ToastStatus,
}

impl ToastState {
    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }
}

/// Handle to a dashboard's toast slot. Cheap to clone.
#[derive(Clone)]
pub struct Toaster {
    inner: Arc<Inner>,
}

struct Inner {
    duration: Duration,
    state: watch::Sender<ToastState>,
    expiry: Mutex<Expiry>,
}

#[derive(Default)]
struct Expiry {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Inner {
    fn expiry(&self) -> MutexGuard<'_, Expiry> {
        self.expiry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Toaster {
    pub fn new(duration: Duration) -> Self {
        let (state, _) = watch::channel(ToastState::default());
        Self {
            inner: Arc::new(Inner {
                duration,
                state,
                expiry: Mutex::new(Expiry::default()),
            }),
        }
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    /// Replace the current toast and restart the expiry timer.
    pub fn show(&self, message: impl Into<String>, status: ToastStatus) {
        let message = message.into();
        debug!(%status, %message, "toast");

        let mut expiry = self.inner.expiry();
        expiry.generation += 1;
        let generation = expiry.generation;
        if let Some(handle) = expiry.handle.take() {
            handle.abort();
        }

        self.inner.state.send_replace(ToastState {
            message: Some(message),
            status,
        });

        let deadline = Instant::now() + self.inner.duration;
        let inner = Arc::clone(&self.inner);
        expiry.handle = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut expiry = inner.expiry();
            if expiry.generation == generation {
                expiry.handle = None;
                inner.state.send_replace(ToastState::default());
            }
        }));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message, ToastStatus::Success);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message, ToastStatus::Error);
    }

    /// Hide the current toast now.
    pub fn clear(&self) {
        let mut expiry = self.inner.expiry();
        expiry.generation += 1;
        if let Some(handle) = expiry.handle.take() {
            handle.abort();
        }
        self.inner.state.send_replace(ToastState::default());
    }

    pub fn current(&self) -> ToastState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ToastState> {
        self.inner.state.subscribe()
    }
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl fmt::Debug for Toaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toaster")
            .field("duration", &self.inner.duration)
            .field("current", &*self.inner.state.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expires_after_duration() {
        let toaster = Toaster::default();
        toaster.success("Files uploaded successfully");
        assert!(toaster.current().is_visible());

        sleep(Duration::from_millis(4_999)).await;
        assert_eq!(toaster.current().status, ToastStatus::Success);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(toaster.current(), ToastState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_toast_replaces_and_restarts_timer() {
        let toaster = Toaster::default();
        toaster.show("m1", ToastStatus::Success);
        sleep(Duration::from_secs(3)).await;
        toaster.show("m2", ToastStatus::Error);

        // m1's timer would have fired at t=5s.
        sleep(Duration::from_millis(2_500)).await;
        let visible = toaster.current();
        assert_eq!(visible.message.as_deref(), Some("m2"));
        assert_eq!(visible.status, ToastStatus::Error);

        sleep(Duration::from_millis(2_501)).await;
        assert!(!toaster.current().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_hides_immediately() {
        let toaster = Toaster::default();
        let rx = toaster.subscribe();
        toaster.error("Failed to delete");
        toaster.clear();
        assert!(!toaster.current().is_visible());
        assert!(rx.has_changed().unwrap_or(false));
        sleep(Duration::from_secs(10)).await;
        assert!(!toaster.current().is_visible());
    }
}
