//! Two-step arm-then-select interaction state machine.
//!
//! # Responsibility
//! - Track which two-step operation (group reference or link) is armed.
//! - Turn the follow-up selection into a commit request.
//!
//! # Invariants
//! - At most one interaction is armed; arming replaces the previous one.
//! - A selection of the wrong node kind leaves the state unchanged.
//! - Producing a commit always returns the machine to `Idle`.

use crate::model::ids::{GroupId, HolderId};
use crate::model::node::NodeRef;

/// Armed state of the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PendingInteraction {
    #[default]
    Idle,
    /// Waiting for the group `holder` should reference.
    ArmedGroupRef(HolderId),
    /// Waiting for the holder a new link in `group` should point at.
    ArmedLink(GroupId),
}

/// Operation produced by a completing selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCommit {
    GroupReference { source: HolderId, target: GroupId },
    Link { parent: GroupId, target: HolderId },
}

impl PendingInteraction {
    pub fn arm_group_ref(&mut self, holder: HolderId) {
        *self = Self::ArmedGroupRef(holder);
    }

    pub fn arm_link(&mut self, group: GroupId) {
        *self = Self::ArmedLink(group);
    }

    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Node the armed interaction started from.
    pub fn armed_node(&self) -> Option<NodeRef> {
        match *self {
            Self::Idle => None,
            Self::ArmedGroupRef(holder) => Some(NodeRef::holder(holder)),
            Self::ArmedLink(group) => Some(NodeRef::group(group)),
        }
    }

    /// Feeds one selection into the machine.
    pub fn select(&mut self, node: NodeRef) -> Option<PendingCommit> {
        let commit = match (*self, node) {
            (Self::ArmedGroupRef(source), NodeRef::Group { id }) => PendingCommit::GroupReference {
                source,
                target: id,
            },
            (Self::ArmedLink(parent), NodeRef::Holder { id }) => PendingCommit::Link {
                parent,
                target: id,
            },
            _ => return None,
        };
        *self = Self::Idle;
        Some(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::{PendingCommit, PendingInteraction};
    use crate::model::ids::{AreaId, GroupId, HolderId};
    use crate::model::node::NodeRef;

    #[test]
    fn group_selection_completes_armed_reference() {
        let mut state = PendingInteraction::default();
        state.arm_group_ref(HolderId(2));

        let commit = state.select(NodeRef::group(GroupId(5)));
        assert_eq!(
            commit,
            Some(PendingCommit::GroupReference {
                source: HolderId(2),
                target: GroupId(5),
            })
        );
        assert_eq!(state, PendingInteraction::Idle);
    }

    #[test]
    fn holder_selection_completes_armed_link() {
        let mut state = PendingInteraction::default();
        state.arm_link(GroupId(1));

        assert_eq!(
            state.select(NodeRef::holder(HolderId(9))),
            Some(PendingCommit::Link {
                parent: GroupId(1),
                target: HolderId(9),
            })
        );
        assert!(!state.is_armed());
    }

    #[test]
    fn wrong_kind_selection_keeps_state() {
        let mut state = PendingInteraction::default();
        state.arm_group_ref(HolderId(2));

        assert_eq!(state.select(NodeRef::holder(HolderId(3))), None);
        assert_eq!(state.select(NodeRef::area(AreaId(1))), None);
        assert_eq!(state, PendingInteraction::ArmedGroupRef(HolderId(2)));

        let mut idle = PendingInteraction::default();
        assert_eq!(idle.select(NodeRef::group(GroupId(1))), None);
        assert_eq!(idle, PendingInteraction::Idle);
    }

    #[test]
    fn arming_replaces_and_cancel_resets() {
        let mut state = PendingInteraction::default();
        state.arm_group_ref(HolderId(2));
        state.arm_link(GroupId(4));
        assert_eq!(state, PendingInteraction::ArmedLink(GroupId(4)));
        assert_eq!(state.armed_node(), Some(NodeRef::group(GroupId(4))));

        state.cancel();
        assert_eq!(state, PendingInteraction::Idle);
        assert_eq!(state.armed_node(), None);
    }
}
