// ── Stream binding table ──
//
// Which host sources which streams, the sorted union of all sourced
// stream ids, and the current overlay selection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Mac, StreamId};

/// What the topology view is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Selection {
    /// Plain topology, no stream overlay.
    #[default]
    Topology,
    Stream(StreamId),
}

impl Selection {
    pub fn stream(self) -> Option<StreamId> {
        match self {
            Self::Topology => None,
            Self::Stream(id) => Some(id),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topology => f.write_str("Topology"),
            Self::Stream(id) => write!(f, "Stream{id}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamBindings {
    sourcing: BTreeMap<Mac, BTreeSet<StreamId>>,
    ids: Vec<StreamId>,
    selected: Selection,
}

impl StreamBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a host's sourcing set and recompute the id union.
    ///
    /// Returns `true` when the active selection was evicted because its id
    /// left the union; the caller should refresh the view.
    pub fn update(&mut self, mac: Mac, ids: BTreeSet<StreamId>) -> bool {
        debug!(mac = %mac, count = ids.len(), "sourcing updated");
        if ids.is_empty() {
            self.sourcing.remove(&mac);
        } else {
            self.sourcing.insert(mac, ids);
        }
        self.recompute()
    }

    /// Drop a host that no longer exists. Same return contract as `update`.
    pub fn forget(&mut self, mac: &Mac) -> bool {
        if self.sourcing.remove(mac).is_none() {
            return false;
        }
        debug!(mac = %mac, "sourcing forgotten");
        self.recompute()
    }

    pub fn clear(&mut self) {
        self.sourcing.clear();
        self.ids.clear();
        self.selected = Selection::Topology;
    }

    /// Select an overlay. Only ids present in the union are accepted.
    pub fn select(&mut self, selection: Selection) -> Result<(), CoreError> {
        if let Selection::Stream(id) = selection {
            if self.ids.binary_search(&id).is_err() {
                return Err(CoreError::UnknownStream { stream_id: id.get() });
            }
        }
        self.selected = selection;
        Ok(())
    }

    /// Sorted, deduplicated union of every host's sourcing ids.
    pub fn ids(&self) -> &[StreamId] {
        &self.ids
    }

    pub fn contains(&self, id: StreamId) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    pub fn selected(&self) -> Selection {
        self.selected
    }

    pub fn sourcing(&self, mac: &Mac) -> Option<&BTreeSet<StreamId>> {
        self.sourcing.get(mac)
    }

    /// Stream menu entries: `"Topology"` followed by `"Stream<id>"` per id.
    pub fn menu_labels(&self) -> Vec<String> {
        std::iter::once(Selection::Topology)
            .chain(self.ids.iter().copied().map(Selection::Stream))
            .map(|s| s.to_string())
            .collect()
    }

    fn recompute(&mut self) -> bool {
        let union: BTreeSet<StreamId> = self.sourcing.values().flatten().copied().collect();
        self.ids = union.into_iter().collect();

        if let Selection::Stream(id) = self.selected {
            if !self.contains(id) {
                debug!(stream_id = %id, "selected stream vanished, back to topology");
                self.selected = Selection::Topology;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ids(raw: &[u32]) -> BTreeSet<StreamId> {
        raw.iter().copied().map(StreamId).collect()
    }

    #[test]
    fn union_is_sorted_and_unique() {
        let mut table = StreamBindings::new();
        table.update(Mac::from("aa"), ids(&[10, 2]));
        table.update(Mac::from("bb"), ids(&[2, 9, 100]));
        assert_eq!(
            table.ids(),
            &[StreamId(2), StreamId(9), StreamId(10), StreamId(100)]
        );
    }

    #[test]
    fn replacing_a_host_drops_its_old_ids() {
        let mut table = StreamBindings::new();
        table.update(Mac::from("aa"), ids(&[1, 2]));
        table.update(Mac::from("aa"), ids(&[3]));
        assert_eq!(table.ids(), &[StreamId(3)]);
    }

    #[test]
    fn vanished_selection_resets_to_topology() {
        let mut table = StreamBindings::new();
        table.update(Mac::from("aa"), ids(&[1, 2]));
        table.select(Selection::Stream(StreamId(2))).unwrap();

        assert!(!table.update(Mac::from("aa"), ids(&[2])));
        assert_eq!(table.selected(), Selection::Stream(StreamId(2)));

        assert!(table.update(Mac::from("aa"), ids(&[1])));
        assert_eq!(table.selected(), Selection::Topology);
    }

    #[test]
    fn forget_evicts_selection() {
        let mut table = StreamBindings::new();
        table.update(Mac::from("aa"), ids(&[4]));
        table.select(Selection::Stream(StreamId(4))).unwrap();

        assert!(table.forget(&Mac::from("aa")));
        assert!(table.ids().is_empty());
        assert_eq!(table.selected(), Selection::Topology);
        assert!(!table.forget(&Mac::from("aa")));
    }

    #[test]
    fn select_rejects_unknown_stream() {
        let mut table = StreamBindings::new();
        table.update(Mac::from("aa"), ids(&[1]));
        assert!(table.select(Selection::Stream(StreamId(7))).is_err());
        assert!(table.select(Selection::Topology).is_ok());
    }

    #[test]
    fn menu_labels_follow_ids() {
        let mut table = StreamBindings::new();
        table.update(Mac::from("aa"), ids(&[12, 3]));
        assert_eq!(table.menu_labels(), vec!["Topology", "Stream3", "Stream12"]);
    }
}
