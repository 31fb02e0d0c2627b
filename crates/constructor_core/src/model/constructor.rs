//! Area, group and holder records.
//!
//! # Responsibility
//! - Define the persisted shape of constructor entities.
//! - Provide the property patch used by holder edits, including the split
//!   between link-owned and target-owned fields.
//!
//! # Invariants
//! - `ConstructorHolder::sub_object` and `link_target_id` are never both set
//!   by engine writes; a link mirrors its target and owns no subtree.
//! - `ConstructorGroup::children` is ordered by persisted sibling order.

use super::ids::{AreaId, GroupId, HolderId};
use serde::{Deserialize, Serialize};

/// External top-level content unit that may own one constructor tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    /// Root group of the area tree, if any.
    pub constructor_group_id: Option<GroupId>,
}

/// Sub-object owned by or referenced from a holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "group_id")]
pub enum SubObject {
    /// Owned nested group. Deleting the holder deletes the group.
    Group(GroupId),
    /// Non-owning reference to a group elsewhere in the forest.
    Ref(GroupId),
}

impl SubObject {
    /// Returns the owned group, if this is an ownership edge.
    pub fn owned_group(self) -> Option<GroupId> {
        match self {
            Self::Group(id) => Some(id),
            Self::Ref(_) => None,
        }
    }
}

/// Ordered container of holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorGroup {
    pub id: GroupId,
    /// Owning holder. `None` for an area root group.
    pub parent_holder_id: Option<HolderId>,
    pub extension_area_id: Option<AreaId>,
    pub alias: String,
    /// Child holders in sibling order.
    pub children: Vec<HolderId>,
}

/// Editable scalar properties of a holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderProperties {
    pub alias: String,
    pub inheritance: bool,
    pub sub_relation_name: String,
    pub super_relation_name: String,
    pub sub_group_aliases: String,
    pub invisible: bool,
    pub is_home: bool,
    pub ask_for_related_area: bool,
    /// Area instantiated by this holder.
    pub area_id: Option<AreaId>,
}

/// Named constructor node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorHolder {
    pub id: HolderId,
    /// Unique among the holders of `parent_group_id`.
    pub name: String,
    pub parent_group_id: GroupId,
    #[serde(flatten)]
    pub properties: HolderProperties,
    pub sub_object: Option<SubObject>,
    /// Set when this holder is a link mirroring another holder.
    pub link_target_id: Option<HolderId>,
}

impl ConstructorHolder {
    /// Returns whether this holder is a link.
    pub fn is_link(&self) -> bool {
        self.link_target_id.is_some()
    }

    /// Owned nested group, if any.
    pub fn owned_group(&self) -> Option<GroupId> {
        self.sub_object.and_then(SubObject::owned_group)
    }
}

/// Insert request for a group. The gateway allocates the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewGroup {
    pub parent_holder_id: Option<HolderId>,
    pub extension_area_id: Option<AreaId>,
    pub alias: String,
}

/// Insert request for a holder appended to `parent_group_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHolder {
    pub parent_group_id: GroupId,
    pub name: String,
    pub properties: HolderProperties,
    pub link_target_id: Option<HolderId>,
}

impl NewHolder {
    /// Plain holder with default properties.
    pub fn named(parent_group_id: GroupId, name: impl Into<String>) -> Self {
        Self {
            parent_group_id,
            name: name.into(),
            properties: HolderProperties::default(),
            link_target_id: None,
        }
    }
}

/// Partial edit of a holder. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolderPatch {
    pub alias: Option<String>,
    pub inheritance: Option<bool>,
    pub sub_relation_name: Option<String>,
    pub super_relation_name: Option<String>,
    pub sub_group_aliases: Option<String>,
    pub invisible: Option<bool>,
    pub is_home: Option<bool>,
    pub ask_for_related_area: Option<bool>,
    pub area_id: Option<Option<AreaId>>,
}

impl HolderPatch {
    /// Returns whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Writes every set field into `properties`.
    pub fn apply_to(&self, properties: &mut HolderProperties) {
        if let Some(value) = &self.alias {
            properties.alias = value.clone();
        }
        if let Some(value) = self.inheritance {
            properties.inheritance = value;
        }
        if let Some(value) = &self.sub_relation_name {
            properties.sub_relation_name = value.clone();
        }
        if let Some(value) = &self.super_relation_name {
            properties.super_relation_name = value.clone();
        }
        if let Some(value) = &self.sub_group_aliases {
            properties.sub_group_aliases = value.clone();
        }
        if let Some(value) = self.invisible {
            properties.invisible = value;
        }
        if let Some(value) = self.is_home {
            properties.is_home = value;
        }
        if let Some(value) = self.ask_for_related_area {
            properties.ask_for_related_area = value;
        }
        if let Some(value) = self.area_id {
            properties.area_id = value;
        }
    }

    /// Splits a patch addressed to a link holder.
    ///
    /// Returns `(link_side, target_side)`. Relation names and sub-group
    /// aliases are stored on the link; inheritance and the identity fields are
    /// stored on the link target.
    pub fn split_for_link(&self) -> (HolderPatch, HolderPatch) {
        let link_side = HolderPatch {
            sub_relation_name: self.sub_relation_name.clone(),
            super_relation_name: self.super_relation_name.clone(),
            sub_group_aliases: self.sub_group_aliases.clone(),
            ..HolderPatch::default()
        };
        let target_side = HolderPatch {
            alias: self.alias.clone(),
            inheritance: self.inheritance,
            invisible: self.invisible,
            is_home: self.is_home,
            ask_for_related_area: self.ask_for_related_area,
            area_id: self.area_id,
            ..HolderPatch::default()
        };
        (link_side, target_side)
    }
}
