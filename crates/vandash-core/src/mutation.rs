// ── Mutation invocations ──
//
// A mutation is one execution of a `Command`, tracked under a fresh id.
// Nothing is cached between invocations. The spawned task always runs to
// completion; dropping every handle only stops anyone from observing it.

use std::fmt;

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

use vandash_api::ApiClient;

use crate::command::{self, Command, CommandResult};
use crate::error::CoreError;

/// Identifier of one mutation invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MutationId(Uuid);

impl MutationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    Pending,
    Success,
    Error,
}

/// Observable state of one invocation.
#[derive(Debug, Clone)]
pub struct MutationState {
    pub id: MutationId,
    pub status: MutationStatus,
    pub data: Option<CommandResult>,
    pub error: Option<CoreError>,
}

impl MutationState {
    pub fn is_settled(&self) -> bool {
        self.status != MutationStatus::Pending
    }

    /// Collapse a settled state into a `Result`.
    pub fn into_result(self) -> Result<CommandResult, CoreError> {
        match (self.data, self.error) {
            (_, Some(err)) => Err(err),
            (Some(data), None) => Ok(data),
            (None, None) => Err(CoreError::Internal(format!(
                "mutation {} has not settled",
                self.id
            ))),
        }
    }
}

/// Handle to a running (or finished) mutation. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MutationHandle {
    id: MutationId,
    state: watch::Receiver<MutationState>,
}

impl MutationHandle {
    /// Start executing `cmd` in the background.
    pub fn spawn(client: ApiClient, cmd: Command) -> Self {
        let id = MutationId::new();
        let name = cmd.name();
        let (tx, rx) = watch::channel(MutationState {
            id,
            status: MutationStatus::Pending,
            data: None,
            error: None,
        });

        debug!(%id, command = name, "mutation started");
        tokio::spawn(async move {
            let result = command::route(&client, cmd).await;
            tx.send_modify(|state| match result {
                Ok(data) => {
                    debug!(%id, command = name, "mutation succeeded");
                    state.status = MutationStatus::Success;
                    state.data = Some(data);
                }
                Err(err) => {
                    warn!(%id, command = name, error = %err, "mutation failed");
                    state.status = MutationStatus::Error;
                    state.error = Some(err);
                }
            });
        });

        Self { id, state: rx }
    }

    pub fn id(&self) -> MutationId {
        self.id
    }

    pub fn current(&self) -> MutationState {
        self.state.borrow().clone()
    }

    /// Wait for the invocation to finish.
    pub async fn settled(&self) -> MutationState {
        let mut rx = self.state.clone();
        if let Ok(state) = rx.wait_for(MutationState::is_settled).await {
            return state.clone();
        }
        // Sender gone without settling: the task panicked or was aborted.
        let mut state = rx.borrow().clone();
        if !state.is_settled() {
            state.status = MutationStatus::Error;
            state.error = Some(CoreError::Internal("mutation task ended early".into()));
        }
        state
    }
}
