// Inverter power button: a status read refreshed on every mount plus an
// undebounced toggle. The displayed state follows the latest toggle reply
// once there is one.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use vandash_api::{ApiClient, InverterStatus, ToggleResponse};

use crate::command::{Command, CommandResult};
use crate::mutation::MutationHandle;
use crate::query::{QuerySubscription, QueryView, StalePolicy};
use crate::toast::{ToastStatus, Toaster};

pub struct InverterControl {
    status: QuerySubscription<InverterStatus>,
    client: ApiClient,
    toaster: Toaster,
    last_toggle: Arc<watch::Sender<Option<ToggleResponse>>>,
    unmounted: CancellationToken,
}

impl InverterControl {
    pub fn mount(status: QuerySubscription<InverterStatus>, client: ApiClient, toaster: Toaster) -> Self {
        let (last_toggle, _) = watch::channel(None);
        Self {
            status,
            client,
            toaster,
            last_toggle: Arc::new(last_toggle),
            unmounted: CancellationToken::new(),
        }
    }

    /// Flip the inverter. The toast is posted when the reply arrives.
    pub fn toggle(&self) -> MutationHandle {
        let handle = MutationHandle::spawn(self.client.clone(), Command::ToggleInverter);

        let observed = handle.clone();
        let toaster = self.toaster.clone();
        let last_toggle = Arc::clone(&self.last_toggle);
        let unmounted = self.unmounted.clone();
        tokio::spawn(async move {
            let state = observed.settled().await;
            let result = state.into_result();
            if let Ok(CommandResult::Inverter(resp)) = &result {
                last_toggle.send_replace(Some(resp.clone()));
            }
            if unmounted.is_cancelled() {
                debug!("inverter control unmounted; toast suppressed");
                return;
            }
            match result {
                Ok(CommandResult::Inverter(resp)) => {
                    let (message, status) = toggle_toast(&resp);
                    toaster.show(message, status);
                }
                Ok(_) => {}
                Err(err) => toaster.error(err.message_or("Failed to toggle inverter")),
            }
        });

        handle
    }

    /// Last toggle reply if any, else the status read.
    pub fn is_on(&self) -> Option<bool> {
        if let Some(resp) = self.last_toggle.borrow().as_ref() {
            return Some(resp.on);
        }
        self.status.data().map(|s| s.on)
    }

    pub fn label(&self) -> &'static str {
        if self.is_on().unwrap_or(false) {
            "Turn Inverter Off"
        } else {
            "Turn Inverter On"
        }
    }

    pub fn view(&self, policy: StalePolicy) -> QueryView<InverterStatus> {
        self.status.view(policy, false)
    }

    pub fn status(&self) -> &QuerySubscription<InverterStatus> {
        &self.status
    }
}

impl Drop for InverterControl {
    fn drop(&mut self) {
        self.unmounted.cancel();
    }
}

/// Toast for a toggle reply: the backend's error text when it sent one.
pub(crate) fn toggle_toast(resp: &ToggleResponse) -> (String, ToastStatus) {
    if let Some(err) = &resp.error {
        return (err.clone(), ToastStatus::Error);
    }
    let message = if resp.on {
        "Inverter is on"
    } else {
        "Inverter is off"
    };
    let status = if resp.success {
        ToastStatus::Success
    } else {
        ToastStatus::Error
    };
    (message.to_owned(), status)
}
