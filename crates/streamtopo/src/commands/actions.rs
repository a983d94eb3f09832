//! Streaming actions: source-for, receive-from, priority.
//!
//! Each action loads a fresh snapshot so the host's attachment point and
//! the stream universe come from the controller, then sends one request.

use std::fmt::Write as _;

use serde::Serialize;

use streamtopo_core::{
    Command, CommandIssuer, CommandResult, Controller, ControllerConfig, Dpid, Mac, PriorityLevel,
    StreamId,
};

use crate::cli::{BindingArgs, GlobalOpts, Level, PriorityArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ActionReport {
    command: Command,
    result: CommandResult,
}

fn detail(report: &ActionReport, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Action: {}", report.command.action());
    match &report.command {
        Command::SourceFor {
            mac,
            dpid,
            port_no,
            stream_id,
        }
        | Command::ReceiveFrom {
            mac,
            dpid,
            port_no,
            stream_id,
        } => {
            let _ = writeln!(out, "Host:   {mac} at {dpid} port {port_no}");
            let _ = writeln!(out, "Stream: {stream_id}");
        }
        Command::PriorityChange {
            dpid,
            stream_id,
            priority,
        } => {
            let _ = writeln!(out, "Switch: {dpid}");
            let _ = writeln!(out, "Stream: {stream_id}");
            let _ = writeln!(out, "Level:  {priority}");
        }
    }
    let _ = write!(out, "Result: {}", output::status("accepted", true, color));
    out
}

impl From<Level> for PriorityLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => Self::Low,
            Level::Mid => Self::Mid,
            Level::High => Self::High,
        }
    }
}

/// Send `command` once. A rejection is reported as an error.
async fn send(config: &ControllerConfig, command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let result = Controller::execute_once(config, &command).await?;
    result.clone().into_result(command.action())?;

    let color = output::should_color(global.color);
    let report = ActionReport { command, result };
    let rendered = output::render_single(
        global.output,
        &report,
        |r| detail(r, color),
        |r| r.command.action().to_owned(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

pub async fn source_for(
    config: &ControllerConfig,
    args: &BindingArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let topology = Controller::snapshot_once(config).await?;
    let command = CommandIssuer::new(topology.store(), topology.streams())
        .source_for(&Mac::new(&args.mac), StreamId(args.stream_id))?;
    send(config, command, global).await
}

pub async fn receive_from(
    config: &ControllerConfig,
    args: &BindingArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let topology = Controller::snapshot_once(config).await?;
    let command = CommandIssuer::new(topology.store(), topology.streams())
        .receive_from(&Mac::new(&args.mac), StreamId(args.stream_id))?;
    send(config, command, global).await
}

pub async fn priority(
    config: &ControllerConfig,
    args: &PriorityArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let topology = Controller::snapshot_once(config).await?;
    let command = CommandIssuer::new(topology.store(), topology.streams()).priority_change(
        &Dpid::new(args.dpid.as_str()),
        StreamId(args.stream_id),
        args.level.into(),
    )?;
    send(config, command, global).await
}
