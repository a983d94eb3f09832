//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod actions;
pub mod config_cmd;
pub mod snapshot;
pub mod watch;

use streamtopo_core::ControllerConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    config: &ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Snapshot(args) => snapshot::handle(config, &args, global).await,
        Command::Watch(args) => watch::handle(config, &args, global).await,
        Command::SourceFor(args) => actions::source_for(config, &args, global).await,
        Command::ReceiveFrom(args) => actions::receive_from(config, &args, global).await,
        Command::Priority(args) => actions::priority(config, &args, global).await,
        // Handled in main before a controller config is built
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions are not controller commands".into(),
        )),
    }
}
