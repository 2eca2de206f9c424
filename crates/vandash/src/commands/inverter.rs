//! Inverter command handlers.

use vandash_core::{Command as CoreCommand, CommandResult, CoreError, Dashboard, InverterStatus};

use crate::cli::{GlobalOpts, InverterArgs, InverterCommand};
use crate::error::CliError;
use crate::output;

fn detail(s: &InverterStatus, color: bool) -> String {
    format!("Inverter: {}", output::on_off(s.on, color))
}

pub async fn handle(
    dashboard: &Dashboard,
    args: InverterArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        InverterCommand::Status => {
            let status = dashboard
                .client()
                .inverter_status()
                .await
                .map_err(CoreError::from)?;
            let out = output::render_single(
                global.output,
                &status,
                |s| detail(s, color),
                |s| if s.on { "on".into() } else { "off".into() },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        InverterCommand::Toggle => {
            let CommandResult::Inverter(resp) =
                dashboard.execute(CoreCommand::ToggleInverter).await?
            else {
                return Err(CliError::Internal("unexpected toggle result".into()));
            };
            if let Some(message) = resp.error.clone() {
                return Err(CliError::Rejected { message });
            }
            if !resp.success {
                return Err(CliError::Rejected {
                    message: "the inverter did not switch".into(),
                });
            }

            let state = InverterStatus { on: resp.on };
            let out = output::render_single(
                global.output,
                &resp,
                |_| detail(&state, color),
                |r| if r.on { "on".into() } else { "off".into() },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
