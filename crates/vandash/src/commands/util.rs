//! Shared helpers for command handlers.

use std::io::{BufRead, IsTerminal};
use std::path::Path;

use secrecy::SecretString;

use vandash_core::UploadFile;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving with `--yes`. Refuses when
/// stdin is not a terminal.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)?;
    Ok(confirmed)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Read a folder password from stdin (first line) or an interactive prompt.
pub fn read_password(from_stdin: bool) -> Result<SecretString, CliError> {
    let password = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password("Folder password: ").map_err(prompt_err)?
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

/// Read a local file for upload, named after its last path component.
pub fn read_upload(path: &Path) -> Result<UploadFile, CliError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::Validation {
            field: "file".into(),
            reason: format!("'{}' has no usable file name", path.display()),
        })?
        .to_owned();
    let bytes = std::fs::read(path)?;
    Ok(UploadFile { file_name, bytes })
}
