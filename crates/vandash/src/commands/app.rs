//! Backend process control.

use vandash_core::Dashboard;

use crate::cli::{AppArgs, AppCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    dashboard: &Dashboard,
    args: AppArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AppCommand::Kill => {
            let prompt = format!(
                "Stop the backend at {}? It is unavailable until restarted.",
                dashboard.config().url
            );
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            dashboard.kill_app().await?;
            output::notice("Backend stopping", global.quiet);
            Ok(())
        }
    }
}
