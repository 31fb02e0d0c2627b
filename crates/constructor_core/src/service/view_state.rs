//! Per-session view state of one editor.
//!
//! # Responsibility
//! - Hold expanded paths, selection, divider position and clipboard for a
//!   single editing session.
//! - Drop entries that no longer resolve after a reload.
//!
//! # Invariants
//! - State is never shared between sessions; each session gets a fresh id.
//! - After `reconcile`, every stored path resolves in the given forest.

use crate::model::node::NodeRef;
use crate::tree::clone::ClonedNode;
use crate::tree::forest::ConstructorForest;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Default divider position between tree and detail panes, in percent.
pub const DEFAULT_DIVIDER_POSITION: u16 = 30;

/// View state scoped to one editor session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionViewState {
    session_id: Uuid,
    expanded: BTreeSet<Vec<NodeRef>>,
    selection: Option<Vec<NodeRef>>,
    divider_position: u16,
    clipboard: Option<ClonedNode>,
}

impl Default for SessionViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionViewState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            expanded: BTreeSet::new(),
            selection: None,
            divider_position: DEFAULT_DIVIDER_POSITION,
            clipboard: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Marks the node at the end of `path` as expanded.
    pub fn expand(&mut self, path: Vec<NodeRef>) {
        if !path.is_empty() {
            self.expanded.insert(path);
        }
    }

    pub fn collapse(&mut self, path: &[NodeRef]) {
        self.expanded.remove(path);
    }

    pub fn is_expanded(&self, path: &[NodeRef]) -> bool {
        self.expanded.contains(path)
    }

    pub fn expanded_paths(&self) -> impl Iterator<Item = &Vec<NodeRef>> {
        self.expanded.iter()
    }

    pub fn select_path(&mut self, path: Vec<NodeRef>) {
        self.selection = Some(path);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<&[NodeRef]> {
        self.selection.as_deref()
    }

    /// Selected node, the last element of the selection path.
    pub fn selected_node(&self) -> Option<NodeRef> {
        self.selection.as_ref().and_then(|path| path.last().copied())
    }

    pub fn divider_position(&self) -> u16 {
        self.divider_position
    }

    /// Stores the divider position, clamped to `0..=100`.
    pub fn set_divider_position(&mut self, position: u16) {
        self.divider_position = position.min(100);
    }

    pub fn set_clipboard(&mut self, node: ClonedNode) {
        self.clipboard = Some(node);
    }

    pub fn clipboard(&self) -> Option<&ClonedNode> {
        self.clipboard.as_ref()
    }

    /// Drops expanded paths and the selection that no longer resolve.
    ///
    /// A path resolves when its first node exists and every following node is
    /// a child of its predecessor. Returns the number of dropped entries.
    pub fn reconcile(&mut self, forest: &ConstructorForest) -> usize {
        let before = self.expanded.len();
        self.expanded.retain(|path| path_resolves(forest, path));
        let mut dropped = before - self.expanded.len();

        if let Some(path) = &self.selection {
            if !path_resolves(forest, path) {
                self.clear_selection();
                dropped += 1;
            }
        }
        dropped
    }
}

fn path_resolves(forest: &ConstructorForest, path: &[NodeRef]) -> bool {
    let Some(first) = path.first() else {
        return false;
    };
    forest.contains(*first)
        && path
            .windows(2)
            .all(|pair| forest.index_of_child(pair[0], pair[1]).is_some())
}

#[cfg(test)]
mod tests {
    use super::{SessionViewState, DEFAULT_DIVIDER_POSITION};
    use crate::model::ids::{AreaId, GroupId, HolderId};
    use crate::model::node::NodeRef;
    use crate::tree::forest::fixtures::sample_forest;

    #[test]
    fn sessions_do_not_share_state() {
        let mut first = SessionViewState::new();
        let second = SessionViewState::new();
        first.expand(vec![NodeRef::area(AreaId(1))]);
        first.set_divider_position(55);

        assert_ne!(first.session_id(), second.session_id());
        assert_eq!(second.expanded_paths().count(), 0);
        assert_eq!(second.divider_position(), DEFAULT_DIVIDER_POSITION);
    }

    #[test]
    fn reconcile_prunes_paths_that_no_longer_resolve() {
        let mut forest = sample_forest();
        let mut state = SessionViewState::new();
        let area = NodeRef::area(AreaId(1));
        let root = NodeRef::group(GroupId(1));
        let holder_a = NodeRef::holder(HolderId(1));
        state.expand(vec![area, root]);
        state.expand(vec![area, root, holder_a]);
        state.select_path(vec![area, root, holder_a, NodeRef::group(GroupId(2))]);

        assert_eq!(state.reconcile(&forest), 0);

        let mut group = forest
            .group(GroupId(1))
            .cloned()
            .expect("root group should exist");
        group.children.retain(|id| *id != HolderId(1));
        forest.insert_group(group);

        assert_eq!(state.reconcile(&forest), 2);
        assert!(state.is_expanded(&[area, root]));
        assert!(!state.is_expanded(&[area, root, holder_a]));
        assert_eq!(state.selection(), None);
    }

    #[test]
    fn divider_is_clamped() {
        let mut state = SessionViewState::new();
        state.set_divider_position(250);
        assert_eq!(state.divider_position(), 100);
    }
}
