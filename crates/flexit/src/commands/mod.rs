//! Command dispatch: bridges CLI args -> session calls -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod info;
pub mod status;
pub mod watch;

use flexit_core::FlexitConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: FlexitConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(config, global).await,
        Command::Info => info::handle(config, global).await,
        Command::Mode { name } => control::set_mode(config, &name, global).await,
        Command::Temp { target, celsius } => {
            control::set_temperature(config, target, celsius, global).await
        }
        Command::Watch(args) => watch::handle(config, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
