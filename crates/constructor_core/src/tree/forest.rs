//! ID-addressed arena holding every loaded area tree.
//!
//! # Responsibility
//! - Store areas, groups and holders of one load in a single arena.
//! - Answer read-only navigation questions: children, parents, paths,
//!   ancestry over ownership edges.
//!
//! # Invariants
//! - Navigation never follows `SubObject::Ref` edges; a group reference is a
//!   leaf node.
//! - Lookups are by ID equality; a reload produces a fresh forest.

use crate::model::constructor::{Area, ConstructorGroup, ConstructorHolder, SubObject};
use crate::model::ids::{AreaId, GroupId, HolderId};
use crate::model::node::NodeRef;
use crate::repo::gateway::LoadedTree;
use std::collections::{BTreeMap, HashMap, HashSet};

/// In-memory constructor forest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructorForest {
    areas: BTreeMap<AreaId, Area>,
    groups: HashMap<GroupId, ConstructorGroup>,
    holders: HashMap<HolderId, ConstructorHolder>,
}

impl ConstructorForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a forest from the area list and the trees loaded for them.
    pub fn from_parts(areas: Vec<Area>, trees: impl IntoIterator<Item = LoadedTree>) -> Self {
        let mut forest = Self::new();
        for area in areas {
            forest.insert_area(area);
        }
        for tree in trees {
            forest.insert_loaded(tree);
        }
        forest
    }

    /// Adds the groups and holders of one loaded tree to the arena.
    pub fn insert_loaded(&mut self, tree: LoadedTree) {
        for group in tree.groups {
            self.insert_group(group);
        }
        for holder in tree.holders {
            self.insert_holder(holder);
        }
    }

    pub fn insert_area(&mut self, area: Area) {
        self.areas.insert(area.id, area);
    }

    pub fn insert_group(&mut self, group: ConstructorGroup) {
        self.groups.insert(group.id, group);
    }

    pub fn insert_holder(&mut self, holder: ConstructorHolder) {
        self.holders.insert(holder.id, holder);
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(&id)
    }

    pub fn group(&self, id: GroupId) -> Option<&ConstructorGroup> {
        self.groups.get(&id)
    }

    pub fn holder(&self, id: HolderId) -> Option<&ConstructorHolder> {
        self.holders.get(&id)
    }

    /// Areas in ascending id order.
    pub fn areas(&self) -> impl Iterator<Item = &Area> {
        self.areas.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &ConstructorGroup> {
        self.groups.values()
    }

    pub fn holders(&self) -> impl Iterator<Item = &ConstructorHolder> {
        self.holders.values()
    }

    /// Returns whether `node` resolves in this forest.
    pub fn contains(&self, node: NodeRef) -> bool {
        match node {
            NodeRef::Area { id } => self.areas.contains_key(&id),
            NodeRef::Group { id } => self.groups.contains_key(&id),
            NodeRef::Holder { id } => self.holders.contains_key(&id),
            NodeRef::GroupRef { holder, target } => self
                .holder(holder)
                .is_some_and(|item| item.sub_object == Some(SubObject::Ref(target))),
        }
    }

    /// Root group of `area`, if the area exists and owns one.
    pub fn root_group_of(&self, area: AreaId) -> Option<GroupId> {
        self.area(area).and_then(|item| item.constructor_group_id)
    }

    /// Area whose root pointer names `group`.
    pub fn area_owning_root(&self, group: GroupId) -> Option<AreaId> {
        self.areas
            .values()
            .find(|area| area.constructor_group_id == Some(group))
            .map(|area| area.id)
    }

    /// Returns the `index`-th child of `parent`.
    pub fn child(&self, parent: NodeRef, index: usize) -> Option<NodeRef> {
        match parent {
            NodeRef::Area { id } => match index {
                0 => self.root_group_of(id).map(NodeRef::group),
                _ => None,
            },
            NodeRef::Group { id } => self
                .group(id)?
                .children
                .get(index)
                .copied()
                .map(NodeRef::holder),
            NodeRef::Holder { id } => match index {
                0 => self.sub_object_node(id),
                _ => None,
            },
            NodeRef::GroupRef { .. } => None,
        }
    }

    /// Number of children of `parent`; zero for unknown nodes.
    pub fn child_count(&self, parent: NodeRef) -> usize {
        match parent {
            NodeRef::Area { id } => usize::from(self.root_group_of(id).is_some()),
            NodeRef::Group { id } => self.group(id).map_or(0, |group| group.children.len()),
            NodeRef::Holder { id } => usize::from(self.sub_object_node(id).is_some()),
            NodeRef::GroupRef { .. } => 0,
        }
    }

    /// Position of `child` under `parent`.
    pub fn index_of_child(&self, parent: NodeRef, child: NodeRef) -> Option<usize> {
        (0..self.child_count(parent)).find(|index| self.child(parent, *index) == Some(child))
    }

    /// All children of `parent` in order.
    pub fn children(&self, parent: NodeRef) -> Vec<NodeRef> {
        (0..self.child_count(parent))
            .filter_map(|index| self.child(parent, index))
            .collect()
    }

    /// Ownership parent of `node`. Reference edges are never reported.
    pub fn parent_of(&self, node: NodeRef) -> Option<NodeRef> {
        match node {
            NodeRef::Area { .. } => None,
            NodeRef::Group { id } => match self.group(id)?.parent_holder_id {
                Some(holder) => Some(NodeRef::holder(holder)),
                None => self.area_owning_root(id).map(NodeRef::area),
            },
            NodeRef::Holder { id } => Some(NodeRef::group(self.holder(id)?.parent_group_id)),
            NodeRef::GroupRef { holder, .. } => Some(NodeRef::holder(holder)),
        }
    }

    /// Area at the top of `node`'s ownership chain.
    pub fn owning_area(&self, node: NodeRef) -> Option<AreaId> {
        let mut visited = HashSet::new();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if let NodeRef::Area { id } = current {
                return Some(id);
            }
            if !visited.insert(current) {
                return None;
            }
            cursor = self.parent_of(current);
        }
        None
    }

    /// Depth-first pre-order search from `root` down to `node`.
    ///
    /// Returns the ordered path `[root, .., node]`; the first hit wins.
    pub fn path_to(&self, root: NodeRef, node: NodeRef) -> Option<Vec<NodeRef>> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        if self.search_path(root, node, &mut path, &mut visited) {
            return Some(path);
        }
        None
    }

    fn search_path(
        &self,
        current: NodeRef,
        node: NodeRef,
        path: &mut Vec<NodeRef>,
        visited: &mut HashSet<NodeRef>,
    ) -> bool {
        if !self.contains(current) || !visited.insert(current) {
            return false;
        }
        path.push(current);
        if current == node {
            return true;
        }
        for child in self.children(current) {
            if self.search_path(child, node, path, visited) {
                return true;
            }
        }
        path.pop();
        false
    }

    /// Returns whether `node` equals `candidate_root` or lies below it along
    /// ownership edges.
    pub fn is_descendant_or_self(&self, candidate_root: NodeRef, node: NodeRef) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == candidate_root {
                return true;
            }
            if !visited.insert(current) {
                return false;
            }
            cursor = self.parent_of(current);
        }
        false
    }

    /// Pre-order list of `node` and everything it owns.
    pub fn subtree_nodes(&self, node: NodeRef) -> Vec<NodeRef> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if !self.contains(current) || !visited.insert(current) {
                continue;
            }
            result.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        result
    }

    /// Names of the holders in `group`, in sibling order.
    pub fn sibling_names(&self, group: GroupId) -> Vec<&str> {
        self.group(group)
            .map(|item| {
                item.children
                    .iter()
                    .filter_map(|id| self.holder(*id))
                    .map(|holder| holder.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns whether `name` is used by a holder of `group` other than `except`.
    pub fn name_taken(&self, group: GroupId, name: &str, except: Option<HolderId>) -> bool {
        self.group(group).is_some_and(|item| {
            item.children
                .iter()
                .filter(|id| Some(**id) != except)
                .filter_map(|id| self.holder(*id))
                .any(|holder| holder.name == name)
        })
    }

    fn sub_object_node(&self, holder: HolderId) -> Option<NodeRef> {
        match self.holder(holder)?.sub_object? {
            SubObject::Group(group) => Some(NodeRef::group(group)),
            SubObject::Ref(target) => Some(NodeRef::group_ref(holder, target)),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::ConstructorForest;
    use crate::model::constructor::{
        Area, ConstructorGroup, ConstructorHolder, HolderProperties, SubObject,
    };
    use crate::model::ids::{AreaId, GroupId, HolderId};

    pub(crate) fn holder(
        id: i64,
        name: &str,
        parent: i64,
        sub_object: Option<SubObject>,
    ) -> ConstructorHolder {
        ConstructorHolder {
            id: HolderId(id),
            name: name.to_string(),
            parent_group_id: GroupId(parent),
            properties: HolderProperties::default(),
            sub_object,
            link_target_id: None,
        }
    }

    pub(crate) fn group(id: i64, parent_holder: Option<i64>, children: &[i64]) -> ConstructorGroup {
        ConstructorGroup {
            id: GroupId(id),
            parent_holder_id: parent_holder.map(HolderId),
            extension_area_id: None,
            alias: String::new(),
            children: children.iter().copied().map(HolderId).collect(),
        }
    }

    /// area#1 -> group#1 [A(group#2 [C(group#3 [E])]), B(ref group#3), D(link -> C)]
    pub(crate) fn sample_forest() -> ConstructorForest {
        let mut forest = ConstructorForest::new();
        forest.insert_area(Area {
            id: AreaId(1),
            name: "Home".to_string(),
            constructor_group_id: Some(GroupId(1)),
        });
        forest.insert_group(group(1, None, &[1, 2, 4]));
        forest.insert_group(group(2, Some(1), &[3]));
        forest.insert_group(group(3, Some(3), &[5]));
        forest.insert_holder(holder(1, "A", 1, Some(SubObject::Group(GroupId(2)))));
        forest.insert_holder(holder(2, "B", 1, Some(SubObject::Ref(GroupId(3)))));
        forest.insert_holder(holder(3, "C", 2, Some(SubObject::Group(GroupId(3)))));
        let mut link = holder(4, "D", 1, None);
        link.link_target_id = Some(HolderId(3));
        forest.insert_holder(link);
        forest.insert_holder(holder(5, "E", 3, None));
        forest
    }
}
