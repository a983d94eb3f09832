// ── Topology entity store ──
//
// Owns the node and link collections and the identity index. Pure data
// structure logic; no I/O and no async.
//
// Links hold their endpoint identities. `source`/`target` positions are a
// cache: any change to the node collection is followed by
// `refresh_node_index` and then `refresh_links`.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::model::{
    Dpid, Host, HostLink, Link, LinkKind, Mac, Node, NodeKey, PortRef, StreamId, Switch,
    SwitchLink,
};

/// Client-side replica of the controller's topology.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: HashMap<NodeKey, usize>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Snapshot load ────────────────────────────────────────────────

    /// Replace the whole replica. Switches load first so links and host
    /// attachments can resolve against them.
    pub fn initialize(&mut self, switches: Vec<Switch>, links: Vec<SwitchLink>, hosts: Vec<Host>) {
        self.clear();
        self.add_switches(switches);
        self.add_links(links);
        self.add_hosts(hosts);
        debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            "topology initialized"
        );
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.index.clear();
    }

    // ── Additions ────────────────────────────────────────────────────

    /// Append switches. Returns how many were added; already-indexed dpids
    /// are skipped.
    pub fn add_switches(&mut self, switches: Vec<Switch>) -> usize {
        let mut added = 0;
        for switch in switches {
            let key = NodeKey::Switch(switch.dpid.clone());
            if self.index.contains_key(&key) {
                debug!(dpid = %switch.dpid, "switch already present, skipped");
                continue;
            }
            debug!(dpid = %switch.dpid, "switch added");
            self.index.insert(key, self.nodes.len());
            self.nodes.push(Node::Switch(switch));
            added += 1;
        }
        self.refresh_node_index();
        added
    }

    /// Append hosts, synthesizing a switch-to-host link for each host whose
    /// switch is indexed right now. Hosts on unknown switches stay orphaned.
    pub fn add_hosts(&mut self, hosts: Vec<Host>) -> usize {
        let mut added = 0;
        for host in hosts {
            let key = NodeKey::Host(host.mac.clone());
            if self.index.contains_key(&key) {
                debug!(mac = %host.mac, "host already present, skipped");
                continue;
            }

            let position = self.nodes.len();
            let switch_position = self.index.get(&NodeKey::Switch(host.dpid.clone())).copied();

            if let Some(source) = switch_position {
                debug!(mac = %host.mac, dpid = %host.dpid, port = %host.port, "host added");
                self.links.push(Link {
                    kind: LinkKind::SwitchToHost(HostLink {
                        switch: PortRef {
                            dpid: host.dpid.clone(),
                            port_no: host.port.clone(),
                        },
                        mac: host.mac.clone(),
                    }),
                    source,
                    target: position,
                });
            } else {
                debug!(mac = %host.mac, dpid = %host.dpid, "host added without attachment");
            }

            self.index.insert(key, position);
            self.nodes.push(Node::Host(host));
            added += 1;
        }
        self.refresh_node_index();
        added
    }

    /// Append switch-to-switch links.
    ///
    /// Only the canonical direction (`src.dpid < dst.dpid`) is kept, and
    /// both switches must be indexed. Everything else is dropped silently.
    pub fn add_links(&mut self, links: Vec<SwitchLink>) -> usize {
        let mut added = 0;
        for link in links {
            if !link.is_canonical() {
                continue;
            }
            let source = self.index.get(&NodeKey::Switch(link.src.dpid.clone())).copied();
            let target = self.index.get(&NodeKey::Switch(link.dst.dpid.clone())).copied();
            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };

            debug!(
                src = %link.src.dpid,
                src_port = %link.src.port_no,
                dst = %link.dst.dpid,
                dst_port = %link.dst.port_no,
                "link added"
            );
            self.links.push(Link {
                kind: LinkKind::SwitchToSwitch(link),
                source,
                target,
            });
            added += 1;
        }
        added
    }

    // ── Removals ─────────────────────────────────────────────────────

    /// Remove switches together with their attached hosts and every link
    /// touching them. Returns the macs of the hosts removed by cascade.
    pub fn delete_switches(&mut self, dpids: &[Dpid]) -> Vec<Mac> {
        let doomed: HashSet<&Dpid> = dpids.iter().collect();
        for dpid in &doomed {
            if !self.index.contains_key(&NodeKey::Switch((*dpid).clone())) {
                warn!(dpid = %dpid, "switch_leave for unknown switch");
            }
        }

        let mut removed_hosts = Vec::new();
        self.nodes.retain(|node| match node {
            Node::Switch(s) => !doomed.contains(&s.dpid),
            Node::Host(h) => {
                if doomed.contains(&h.dpid) {
                    removed_hosts.push(h.mac.clone());
                    false
                } else {
                    true
                }
            }
        });
        self.links
            .retain(|link| !doomed.iter().any(|dpid| link.kind.touches(dpid)));

        debug!(
            switches = dpids.len(),
            hosts = removed_hosts.len(),
            "switches removed"
        );

        self.refresh_node_index();
        self.refresh_links();
        removed_hosts
    }

    /// Remove switch-to-switch links. Either direction may be given; a link
    /// that is not stored is a no-op. Returns how many were removed.
    pub fn delete_links(&mut self, links: Vec<SwitchLink>) -> usize {
        let mut removed = 0;
        for link in links {
            let wanted = LinkKind::SwitchToSwitch(link.canonical());
            if let Some(i) = self.get_link_index(&wanted) {
                // Node positions are untouched, so other links stay valid.
                self.links.remove(i);
                removed += 1;
                debug!(?wanted, "link removed");
            } else {
                debug!(?wanted, "link_delete for absent link");
            }
        }
        removed
    }

    // ── Attribute updates ────────────────────────────────────────────

    /// Replace each known switch's priority map. Unknown dpids are skipped.
    pub fn update_switches(&mut self, switches: Vec<Switch>) -> usize {
        let mut updated = 0;
        for update in switches {
            let position = self.index.get(&NodeKey::Switch(update.dpid.clone())).copied();
            if let Some(Node::Switch(switch)) = position.and_then(|i| self.nodes.get_mut(i)) {
                debug!(dpid = %update.dpid, "switch priority replaced");
                switch.priority = update.priority;
                updated += 1;
            } else {
                warn!(dpid = %update.dpid, "update for unknown switch, skipped");
            }
        }
        updated
    }

    /// Replace each known host's sourcing/receiving sets.
    ///
    /// Returns the `(mac, sourcing)` pairs that were applied so the caller
    /// can forward them to the stream bindings. Unknown macs are skipped.
    pub fn update_hosts(&mut self, hosts: Vec<Host>) -> Vec<(Mac, BTreeSet<StreamId>)> {
        let mut applied = Vec::new();
        for update in hosts {
            let position = self.index.get(&NodeKey::Host(update.mac.clone())).copied();
            if let Some(Node::Host(host)) = position.and_then(|i| self.nodes.get_mut(i)) {
                debug!(mac = %update.mac, "host streams replaced");
                host.sourcing = update.sourcing;
                host.receiving = update.receiving;
                applied.push((host.mac.clone(), host.sourcing.clone()));
            } else {
                warn!(mac = %update.mac, "update for unknown host, skipped");
            }
        }
        applied
    }

    // ── Index maintenance ────────────────────────────────────────────

    /// Position of the stored link equal to `kind`, if any.
    pub fn get_link_index(&self, kind: &LinkKind) -> Option<usize> {
        self.links.iter().position(|l| &l.kind == kind)
    }

    /// Rebuild identity -> position from the node collection.
    pub fn refresh_node_index(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.key(), i))
            .collect();
    }

    /// Re-resolve every link's cached positions through the node index.
    /// Must run after `refresh_node_index`. Links whose endpoints no longer
    /// resolve are dropped.
    pub fn refresh_links(&mut self) {
        let index = &self.index;
        self.links.retain_mut(|link| {
            let source = index.get(&link.kind.source_key());
            let target = index.get(&link.kind.target_key());
            match (source, target) {
                (Some(&source), Some(&target)) => {
                    link.source = source;
                    link.target = target;
                    true
                }
                _ => {
                    warn!(kind = ?link.kind, "dangling link dropped");
                    false
                }
            }
        });
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn position(&self, key: &NodeKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.position(key).and_then(|i| self.nodes.get(i))
    }

    pub fn switch(&self, dpid: &Dpid) -> Option<&Switch> {
        self.node(&NodeKey::Switch(dpid.clone()))
            .and_then(Node::as_switch)
    }

    pub fn host(&self, mac: &Mac) -> Option<&Host> {
        self.node(&NodeKey::Host(mac.clone())).and_then(Node::as_host)
    }

    pub fn switches(&self) -> impl Iterator<Item = &Switch> {
        self.nodes.iter().filter_map(Node::as_switch)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.nodes.iter().filter_map(Node::as_host)
    }

    pub fn switch_count(&self) -> usize {
        self.switches().count()
    }

    pub fn host_count(&self) -> usize {
        self.hosts().count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
