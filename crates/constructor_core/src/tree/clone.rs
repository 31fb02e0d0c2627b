//! ID-free deep copies of constructor subtrees.
//!
//! # Invariants
//! - Clones carry no ids; the gateway assigns them on insert.
//! - A group reference is copied as a reference to the same target group.
//! - `link_target_id` is copied raw and re-resolved on the next load.

use super::forest::ConstructorForest;
use crate::model::constructor::{HolderProperties, SubObject};
use crate::model::ids::{AreaId, GroupId, HolderId};
use crate::model::node::NodeRef;
use std::collections::HashSet;

/// Cloned holder together with everything it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedHolder {
    pub name: String,
    pub properties: HolderProperties,
    pub link_target_id: Option<HolderId>,
    pub sub_object: Option<ClonedSubObject>,
}

/// Cloned group and its holders in sibling order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClonedGroup {
    pub alias: String,
    pub extension_area_id: Option<AreaId>,
    pub children: Vec<ClonedHolder>,
}

/// Sub-object of a cloned holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClonedSubObject {
    /// Owned group, deep-copied.
    Group(ClonedGroup),
    /// Reference kept pointing at the original target.
    Ref(GroupId),
}

/// Root of a cloned subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClonedNode {
    Group(ClonedGroup),
    Holder(ClonedHolder),
}

impl ClonedNode {
    /// Holders to insert when pasting this clone into a group.
    pub fn into_holders(self) -> Vec<ClonedHolder> {
        match self {
            Self::Group(group) => group.children,
            Self::Holder(holder) => vec![holder],
        }
    }

    /// Number of holders in the clone, nested ones included.
    pub fn holder_count(&self) -> usize {
        match self {
            Self::Group(group) => group.holder_count(),
            Self::Holder(holder) => holder.holder_count(),
        }
    }

    /// Number of owned groups in the clone, the root included.
    pub fn group_count(&self) -> usize {
        match self {
            Self::Group(group) => group.group_count(),
            Self::Holder(holder) => holder.group_count(),
        }
    }
}

impl ClonedHolder {
    /// Targets of every group reference in this clone, nested ones included.
    pub fn referenced_groups(&self) -> Vec<GroupId> {
        let mut targets = Vec::new();
        self.collect_references(&mut targets);
        targets
    }

    fn collect_references(&self, targets: &mut Vec<GroupId>) {
        match &self.sub_object {
            Some(ClonedSubObject::Ref(target)) => targets.push(*target),
            Some(ClonedSubObject::Group(group)) => group
                .children
                .iter()
                .for_each(|child| child.collect_references(targets)),
            None => {}
        }
    }

    pub fn holder_count(&self) -> usize {
        1 + match &self.sub_object {
            Some(ClonedSubObject::Group(group)) => group.holder_count(),
            _ => 0,
        }
    }

    pub fn group_count(&self) -> usize {
        match &self.sub_object {
            Some(ClonedSubObject::Group(group)) => group.group_count(),
            _ => 0,
        }
    }
}

impl ClonedGroup {
    pub fn holder_count(&self) -> usize {
        self.children.iter().map(ClonedHolder::holder_count).sum()
    }

    pub fn group_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ClonedHolder::group_count)
            .sum::<usize>()
    }
}

impl ConstructorForest {
    /// Deep-copies a holder or group subtree.
    ///
    /// Returns `None` for areas, group references and unknown nodes.
    pub fn clone_tree(&self, node: NodeRef) -> Option<ClonedNode> {
        let mut visited = HashSet::new();
        match node {
            NodeRef::Group { id } => self.clone_group(id, &mut visited).map(ClonedNode::Group),
            NodeRef::Holder { id } => self.clone_holder(id, &mut visited).map(ClonedNode::Holder),
            NodeRef::Area { .. } | NodeRef::GroupRef { .. } => None,
        }
    }

    fn clone_group(&self, id: GroupId, visited: &mut HashSet<GroupId>) -> Option<ClonedGroup> {
        if !visited.insert(id) {
            return None;
        }
        let group = self.group(id)?;
        let children = group
            .children
            .iter()
            .map(|child| self.clone_holder(*child, visited))
            .collect::<Option<Vec<_>>>()?;
        Some(ClonedGroup {
            alias: group.alias.clone(),
            extension_area_id: group.extension_area_id,
            children,
        })
    }

    fn clone_holder(&self, id: HolderId, visited: &mut HashSet<GroupId>) -> Option<ClonedHolder> {
        let holder = self.holder(id)?;
        let sub_object = match holder.sub_object {
            Some(SubObject::Group(group)) => {
                Some(ClonedSubObject::Group(self.clone_group(group, visited)?))
            }
            Some(SubObject::Ref(target)) => Some(ClonedSubObject::Ref(target)),
            None => None,
        };
        Some(ClonedHolder {
            name: holder.name.clone(),
            properties: holder.properties.clone(),
            link_target_id: holder.link_target_id,
            sub_object,
        })
    }
}
