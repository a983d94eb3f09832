//! One-shot topology views.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Serialize;
use tabled::Tabled;

use streamtopo_core::{
    Controller, ControllerConfig, Host, Link, LinkKind, LinkStyle, Mac, Node, Port, Selection,
    StreamId, Switch, TopologySnapshot,
};

use crate::cli::{GlobalOpts, SnapshotArgs, TopologyView};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct SwitchRow {
    #[tabled(rename = "DPID")]
    dpid: String,
    #[tabled(rename = "Priorities")]
    priorities: String,
}

#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Switch")]
    dpid: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Sourcing")]
    sourcing: String,
    #[tabled(rename = "Receiving")]
    receiving: String,
    #[tabled(rename = "Playlist")]
    playlist: String,
}

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Style")]
    style: String,
}

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Switch")]
    dpid: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Link")]
    link: usize,
}

#[derive(Tabled)]
struct StreamRow {
    #[tabled(rename = "Stream")]
    stream: u32,
    #[tabled(rename = "Sources")]
    sources: String,
}

// ── Serializable views ──────────────────────────────────────────────

#[derive(Serialize)]
struct LinkEntry<'a> {
    link: &'a Link,
    style: LinkStyle,
}

#[derive(Serialize)]
struct StreamEntry {
    stream_id: StreamId,
    sources: Vec<Mac>,
}

#[derive(Serialize)]
pub(crate) struct Summary {
    pub generation: u64,
    pub switches: usize,
    pub hosts: usize,
    pub links: usize,
    pub streams: Vec<StreamId>,
    pub selection: Selection,
}

impl Summary {
    pub(crate) fn of(snap: &TopologySnapshot) -> Self {
        Self {
            generation: snap.generation,
            switches: snap.switch_count(),
            hosts: snap.host_count(),
            links: snap.links.len(),
            streams: snap.stream_ids.clone(),
            selection: snap.selection,
        }
    }

    pub(crate) fn one_line(&self) -> String {
        format!(
            "{} switches, {} hosts, {} links, streams [{}]",
            self.switches,
            self.hosts,
            self.links,
            join(&self.streams)
        )
    }
}

// ── Formatting helpers ──────────────────────────────────────────────

fn join<T: ToString>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn id_list(ids: &BTreeSet<StreamId>) -> String {
    if ids.is_empty() { "-".into() } else { join(ids) }
}

fn style_label(style: LinkStyle) -> String {
    match style {
        LinkStyle::Active { priority, hue } => format!("priority {priority} (hue {hue})"),
        LinkStyle::Inactive => "inactive".into(),
    }
}

fn endpoint(snap: &TopologySnapshot, index: usize) -> String {
    snap.nodes
        .get(index)
        .map_or_else(|| format!("#{index}"), |n| n.label().to_owned())
}

fn summary_detail(s: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Switches:  {}", s.switches);
    let _ = writeln!(out, "Hosts:     {}", s.hosts);
    let _ = writeln!(out, "Links:     {}", s.links);
    let streams = if s.streams.is_empty() {
        "-".into()
    } else {
        join(&s.streams)
    };
    let _ = writeln!(out, "Streams:   {streams}");
    let _ = write!(out, "Selection: {}", s.selection);
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: &ControllerConfig,
    args: &SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut topology = Controller::snapshot_once(config).await?;
    if let Some(id) = args.stream {
        topology.select(Selection::Stream(StreamId(id)))?;
    }
    let snap = TopologySnapshot::capture(topology.store(), topology.streams(), 1);

    let rendered = render(&snap, args.view, global)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

pub(crate) fn render(
    snap: &TopologySnapshot,
    view: TopologyView,
    global: &GlobalOpts,
) -> Result<String, CliError> {
    let format = global.output;
    match view {
        TopologyView::Summary => output::render_single(
            format,
            &Summary::of(snap),
            summary_detail,
            |s| s.generation.to_string(),
        ),
        TopologyView::Switches => {
            let switches: Vec<&Switch> = snap.nodes.iter().filter_map(Node::as_switch).collect();
            output::render_list(
                format,
                &switches,
                |s| SwitchRow {
                    dpid: s.dpid.to_string(),
                    priorities: if s.priority.is_empty() {
                        "-".into()
                    } else {
                        join(s.priority.iter().map(|(id, p)| format!("{id}:{p}")))
                    },
                },
                |s| s.dpid.to_string(),
            )
        }
        TopologyView::Hosts => {
            let hosts: Vec<&Host> = snap.nodes.iter().filter_map(Node::as_host).collect();
            output::render_list(
                format,
                &hosts,
                |h| HostRow {
                    mac: h.mac.to_string(),
                    dpid: h.dpid.to_string(),
                    port: h.port.to_string(),
                    sourcing: id_list(&h.sourcing),
                    receiving: id_list(&h.receiving),
                    playlist: h.playlist_path().unwrap_or_else(|| "-".into()),
                },
                |h| h.mac.to_string(),
            )
        }
        TopologyView::Links => {
            let entries: Vec<LinkEntry<'_>> = snap
                .links
                .iter()
                .zip(snap.link_styles.iter().copied())
                .map(|(link, style)| LinkEntry { link, style })
                .collect();
            output::render_list(
                format,
                &entries,
                |e| LinkRow {
                    kind: match e.link.kind {
                        LinkKind::SwitchToSwitch(_) => "switch-switch",
                        LinkKind::SwitchToHost(_) => "switch-host",
                    },
                    source: endpoint(snap, e.link.source),
                    target: endpoint(snap, e.link.target),
                    style: style_label(e.style),
                },
                |e| format!("{} {}", e.link.kind.source_key(), e.link.kind.target_key()),
            )
        }
        TopologyView::Ports => output::render_list(
            format,
            &snap.ports,
            |p: &Port| PortRow {
                dpid: p.dpid.to_string(),
                port: p.port_no.to_string(),
                link: p.link,
            },
            |p| format!("{}:{}", p.dpid, p.port_no),
        ),
        TopologyView::Streams => {
            let entries: Vec<StreamEntry> = snap
                .stream_ids
                .iter()
                .map(|&stream_id| StreamEntry {
                    stream_id,
                    sources: snap
                        .nodes
                        .iter()
                        .filter_map(Node::as_host)
                        .filter(|h| h.sourcing.contains(&stream_id))
                        .map(|h| h.mac.clone())
                        .collect(),
                })
                .collect();
            output::render_list(
                format,
                &entries,
                |e| StreamRow {
                    stream: e.stream_id.get(),
                    sources: join(&e.sources),
                },
                |e| e.stream_id.to_string(),
            )
        }
    }
}
