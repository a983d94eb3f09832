//! Follow the live topology until interrupted.

use tokio_stream::StreamExt;

use streamtopo_core::{ConnectionState, Controller, ControllerConfig, TopologySnapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::snapshot::Summary;

fn render_update(snap: &TopologySnapshot, format: OutputFormat, color: bool) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::Table => {
            let stamp = snap.taken_at.format("%H:%M:%S").to_string();
            format!(
                "{} gen {}: {}",
                output::dim(&stamp, color),
                snap.generation,
                Summary::of(snap).one_line()
            )
        }
        // One document per line so the stream can be piped
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(snap).map_err(|e| CliError::Render(e.to_string()))?
        }
        OutputFormat::Yaml => {
            let doc = serde_yaml::to_string(snap).map_err(|e| CliError::Render(e.to_string()))?;
            format!("---\n{doc}")
        }
        OutputFormat::Plain => snap.generation.to_string(),
    };
    Ok(rendered)
}

fn state_label(state: &ConnectionState) -> String {
    match state {
        ConnectionState::Disconnected => "disconnected".into(),
        ConnectionState::Connecting => "connecting".into(),
        ConnectionState::Connected => "connected".into(),
        ConnectionState::Reconnecting { attempt } => format!("reconnecting (attempt {attempt})"),
        ConnectionState::Failed => "failed".into(),
    }
}

pub async fn handle(
    config: &ControllerConfig,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    let controller = Controller::new(config.clone())?;
    controller.connect().await?;

    let topology = controller.topology();
    let mut state = controller.connection_state();
    output::print_output(&render_update(topology.current(), global.output, color)?, global.quiet);
    let mut updates = topology.into_stream();

    let mut seen: u64 = 0;
    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            next = updates.next() => {
                let Some(snap) = next else { break Ok(()) };
                output::print_output(&render_update(&snap, global.output, color)?, global.quiet);
                seen += 1;
                if args.count.is_some_and(|n| seen >= n) {
                    break Ok(());
                }
            }
            res = state.changed() => {
                if res.is_err() {
                    break Ok(());
                }
                let current = state.borrow_and_update().clone();
                if !global.quiet {
                    let ok = matches!(current, ConnectionState::Connected);
                    eprintln!("{}", output::status(&state_label(&current), ok, color));
                }
                if current == ConnectionState::Failed {
                    break Err(CliError::ConnectionFailed {
                        url: config.url.to_string(),
                        reason: "notification socket retries exhausted".into(),
                    });
                }
            }
        }
    };

    controller.disconnect().await;
    outcome
}
