// ── Per-key query state ──
//
// Every fetch takes a sequence number when it is issued. A completion is
// committed only if its number is newer than the last committed one, so a
// slow response can never overwrite a fresher one. Failures keep the last
// good `data` around; the stale policy decides whether it is still shown.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use strum::Display;

use crate::error::CoreError;
use crate::gate::{self, Gate, GateInput};

/// Lifecycle status of a query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of one query key, shared with every subscriber.
#[derive(Debug)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    /// Last successfully fetched value. Survives later failures.
    pub data: Option<Arc<T>>,
    /// Error from the most recent committed fetch, cleared on success.
    pub error: Option<CoreError>,
    /// Completion time of the most recent committed fetch.
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// Completion time of the most recent successful fetch.
    pub last_success_at: Option<DateTime<Utc>>,
    issued_seq: u64,
    committed_seq: u64,
}

// Manual impls: `T` lives behind an `Arc`, so it need not be `Clone`.
impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
            last_success_at: self.last_success_at,
            issued_seq: self.issued_seq,
            committed_seq: self.committed_seq,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            last_fetched_at: None,
            last_success_at: None,
            issued_seq: 0,
            committed_seq: 0,
        }
    }
}

/// How long last-good data may be shown after a failed refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalePolicy {
    pub tolerance: Duration,
}

impl StalePolicy {
    pub fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    /// Never show stale data: any failure surfaces immediately.
    pub fn strict() -> Self {
        Self {
            tolerance: Duration::ZERO,
        }
    }
}

/// What a view should render for a query right now.
#[derive(Debug, Clone)]
pub enum QueryView<T> {
    Loading,
    Error(CoreError),
    Content {
        data: Arc<T>,
        /// The latest refetch failed; `data` is from an earlier success.
        stale: bool,
    },
}

impl<T> QueryView<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn content(&self) -> Option<&Arc<T>> {
        match self {
            Self::Content { data, .. } => Some(data),
            _ => None,
        }
    }
}

impl<T> QueryState<T> {
    /// A fetch is in flight that has not been committed yet.
    pub fn is_fetching(&self) -> bool {
        self.issued_seq > self.committed_seq
    }

    /// In flight with nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.is_fetching() && self.data.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Flags for the loading/error/content gate.
    pub fn gate_input(&self, check_fetching: bool) -> GateInput {
        GateInput {
            is_loading: self.is_loading(),
            is_fetching: self.is_fetching(),
            has_error: self.error.is_some(),
            check_fetching,
        }
    }

    /// Resolve the view against the wall clock.
    pub fn view(&self, policy: StalePolicy, check_fetching: bool) -> QueryView<T> {
        self.view_at(Utc::now(), policy, check_fetching)
    }

    /// Resolve the view as of `now`.
    ///
    /// An error hides last-good data only once that data is older than the
    /// policy's tolerance.
    pub fn view_at(
        &self,
        now: DateTime<Utc>,
        policy: StalePolicy,
        check_fetching: bool,
    ) -> QueryView<T> {
        match gate::select(self.gate_input(check_fetching)) {
            Gate::Loading => QueryView::Loading,
            Gate::ErrorDisplay => {
                if let (Some(data), Some(ok_at)) = (&self.data, self.last_success_at) {
                    let age = now.signed_duration_since(ok_at).to_std().unwrap_or_default();
                    if age <= policy.tolerance {
                        return QueryView::Content {
                            data: Arc::clone(data),
                            stale: true,
                        };
                    }
                }
                match &self.error {
                    Some(err) => QueryView::Error(err.clone()),
                    None => QueryView::Loading,
                }
            }
            Gate::Content => match &self.data {
                Some(data) => QueryView::Content {
                    data: Arc::clone(data),
                    stale: false,
                },
                // Idle: the first fetch hasn't been issued yet.
                None => QueryView::Loading,
            },
        }
    }

    // ── Transitions (driven by the query entry) ──────────────────────

    pub(crate) fn begin(&mut self, seq: u64) {
        self.issued_seq = self.issued_seq.max(seq);
        if self.status == QueryStatus::Idle {
            self.status = QueryStatus::Loading;
        }
    }

    /// Apply a completed fetch. Returns `false` (and changes nothing) when a
    /// newer fetch has already been committed.
    pub(crate) fn commit(
        &mut self,
        seq: u64,
        result: Result<T, CoreError>,
        now: DateTime<Utc>,
    ) -> bool {
        if seq <= self.committed_seq {
            return false;
        }
        self.committed_seq = seq;
        self.last_fetched_at = Some(now);
        match result {
            Ok(value) => {
                self.data = Some(Arc::new(value));
                self.error = None;
                self.status = QueryStatus::Success;
                self.last_success_at = Some(now);
            }
            Err(err) => {
                self.error = Some(err);
                self.status = QueryStatus::Error;
            }
        }
        true
    }
}
