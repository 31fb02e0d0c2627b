//! Navigable node kinds of the constructor forest.

use super::ids::{AreaId, GroupId, HolderId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Tagged reference to one navigable node.
///
/// Equality is by IDs only, so values stay meaningful across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NodeRef {
    /// Area owning a root group.
    Area { id: AreaId },
    /// Constructor group.
    Group { id: GroupId },
    /// Constructor holder, including link holders.
    Holder { id: HolderId },
    /// Reference edge from `holder` to `target`. Has no children.
    GroupRef { holder: HolderId, target: GroupId },
}

impl NodeRef {
    pub fn area(id: AreaId) -> Self {
        Self::Area { id }
    }

    pub fn group(id: GroupId) -> Self {
        Self::Group { id }
    }

    pub fn holder(id: HolderId) -> Self {
        Self::Holder { id }
    }

    pub fn group_ref(holder: HolderId, target: GroupId) -> Self {
        Self::GroupRef { holder, target }
    }

    pub fn as_group(self) -> Option<GroupId> {
        match self {
            Self::Group { id } => Some(id),
            _ => None,
        }
    }

    /// Short kind label used in logs and error messages.
    pub fn kind_label(self) -> &'static str {
        match self {
            Self::Area { .. } => "area",
            Self::Group { .. } => "group",
            Self::Holder { .. } => "holder",
            Self::GroupRef { .. } => "group_ref",
        }
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Area { id } => write!(f, "{id}"),
            Self::Group { id } => write!(f, "{id}"),
            Self::Holder { id } => write!(f, "{id}"),
            Self::GroupRef { holder, target } => write!(f, "ref({holder} -> {target})"),
        }
    }
}
