// ── Command API ──
//
// Every write against the backend is a `Command`. `route` maps each variant
// onto its endpoint; callers either await it directly (`Dashboard::execute`)
// or run it as a tracked mutation (`MutationHandle::spawn`).

use secrecy::SecretString;
use tracing::debug;

use vandash_api::{
    ApiClient, FolderResponse, LedConfigureRequest, LedStatus, SuccessResponse, ToggleResponse,
    UploadFile, UploadResponse,
};

use crate::error::CoreError;

/// All write operations against the dashboard backend.
#[derive(Debug)]
pub enum Command {
    // ── Devices ──────────────────────────────────────────────────────
    ToggleInverter,
    ConfigureLeds(LedConfigureRequest),

    // ── Files ────────────────────────────────────────────────────────
    UploadFile {
        file: UploadFile,
        folder: Option<String>,
    },
    CreateFolder {
        name: String,
        path: Option<String>,
    },
    DeleteFile {
        path: String,
    },
    AuthenticateFolder {
        path: String,
        password: SecretString,
    },
    LockFolder {
        path: String,
    },
    UnlockFolder {
        path: String,
    },

    // ── System ───────────────────────────────────────────────────────
    KillApp,
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleInverter => "toggle_inverter",
            Self::ConfigureLeds(_) => "configure_leds",
            Self::UploadFile { .. } => "upload_file",
            Self::CreateFolder { .. } => "create_folder",
            Self::DeleteFile { .. } => "delete_file",
            Self::AuthenticateFolder { .. } => "authenticate_folder",
            Self::LockFolder { .. } => "lock_folder",
            Self::UnlockFolder { .. } => "unlock_folder",
            Self::KillApp => "kill_app",
        }
    }
}

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    Ok,
    Inverter(ToggleResponse),
    Leds(LedStatus),
    Uploaded(UploadResponse),
    FolderCreated(FolderResponse),
}

/// Run `cmd` against the backend.
///
/// `{success: false}` acknowledgements become `CoreError::Rejected`; the
/// inverter toggle is returned as-is because its body carries its own
/// `error` text for the caller to show.
pub async fn route(client: &ApiClient, cmd: Command) -> Result<CommandResult, CoreError> {
    debug!(command = cmd.name(), "routing command");
    match cmd {
        Command::ToggleInverter => Ok(CommandResult::Inverter(client.toggle_inverter().await?)),

        Command::ConfigureLeds(req) => Ok(CommandResult::Leds(client.configure_leds(&req).await?)),

        Command::UploadFile { file, folder } => {
            let name = file.file_name.clone();
            let resp = client.upload_file(file, folder.as_deref()).await?;
            if !resp.success {
                return Err(CoreError::Rejected {
                    message: format!("upload of {name} was rejected"),
                });
            }
            Ok(CommandResult::Uploaded(resp))
        }

        Command::CreateFolder { name, path } => {
            let resp = client.create_folder(&name, path.as_deref()).await?;
            if !resp.success {
                return Err(CoreError::Rejected {
                    message: format!("folder {name} was not created"),
                });
            }
            Ok(CommandResult::FolderCreated(resp))
        }

        Command::DeleteFile { path } => {
            let resp = client.delete_file(&path).await?;
            acknowledged(resp, || format!("{path} was not deleted"))
        }

        Command::AuthenticateFolder { path, password } => {
            let resp = client.authenticate_folder(&path, &password).await?;
            acknowledged(resp, || "Invalid password".to_owned())
        }

        Command::LockFolder { path } => {
            let resp = client.lock_folder(&path).await?;
            acknowledged(resp, || format!("{path} was not locked"))
        }

        Command::UnlockFolder { path } => {
            let resp = client.unlock_folder(&path).await?;
            acknowledged(resp, || format!("{path} was not unlocked"))
        }

        Command::KillApp => {
            client.kill_app().await?;
            Ok(CommandResult::Ok)
        }
    }
}

fn acknowledged(
    resp: SuccessResponse,
    message: impl FnOnce() -> String,
) -> Result<CommandResult, CoreError> {
    if resp.success {
        Ok(CommandResult::Ok)
    } else {
        Err(CoreError::Rejected { message: message() })
    }
}
