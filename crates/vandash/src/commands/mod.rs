//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod app;
pub mod config_cmd;
pub mod files;
pub mod inverter;
pub mod leds;
pub mod sensors;
pub mod status;
pub mod util;
pub mod watch;

use vandash_core::Dashboard;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    dashboard: &Dashboard,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(dashboard, global).await,
        Command::Watch(args) => watch::handle(dashboard, args, global).await,
        Command::Inverter(args) => inverter::handle(dashboard, args, global).await,
        Command::Leds(args) => leds::handle(dashboard, args, global).await,
        Command::Level => sensors::level(dashboard, global).await,
        Command::Battery => sensors::battery(dashboard, global).await,
        Command::Files(args) => files::handle(dashboard, args, global).await,
        Command::App(args) => app::handle(dashboard, args, global).await,
        // Config and Completions are handled before a backend is resolved
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not talk to the backend".into(),
        )),
    }
}
