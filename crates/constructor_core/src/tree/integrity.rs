//! Structural invariant checks run after every load.
//!
//! # Invariants
//! - Ownership edges form a strict forest rooted at areas.
//! - Group ownership is recorded consistently on both ends.
//! - Holder names are unique within their group.
//! - Group references point at existing groups.
//!
//! Broken links are not integrity failures; they are reported by
//! [`crate::tree::links::LinkResolution`].

use super::forest::ConstructorForest;
use crate::model::constructor::SubObject;
use crate::model::ids::{AreaId, GroupId, HolderId};
use crate::model::node::NodeRef;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// First invariant violation found in a loaded forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// Area points at a root group that was not loaded.
    MissingRootGroup { area: AreaId, group: GroupId },
    /// Area root group claims an owning holder.
    RootGroupHasOwner { area: AreaId, group: GroupId },
    /// Group lists a child holder that was not loaded.
    MissingChild { group: GroupId, holder: HolderId },
    /// Holder is listed by one group but records another parent.
    ParentMismatch {
        holder: HolderId,
        listed_in: GroupId,
        recorded: GroupId,
    },
    /// Holder is not listed among its parent's children.
    OrphanHolder { holder: HolderId, group: GroupId },
    /// Owner and owned group disagree about the ownership edge.
    OwnershipMismatch { holder: HolderId, group: GroupId },
    /// Ownership edges revisit a node.
    OwnershipCycle(NodeRef),
    /// Two siblings share a name.
    DuplicateName { group: GroupId, name: String },
    /// Group reference target was not loaded.
    MissingReferenceTarget { holder: HolderId, target: GroupId },
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRootGroup { area, group } => {
                write!(f, "{area} points at missing root {group}")
            }
            Self::RootGroupHasOwner { area, group } => {
                write!(f, "root {group} of {area} must not have an owning holder")
            }
            Self::MissingChild { group, holder } => {
                write!(f, "{group} lists missing child {holder}")
            }
            Self::ParentMismatch {
                holder,
                listed_in,
                recorded,
            } => write!(
                f,
                "{holder} is listed in {listed_in} but records parent {recorded}"
            ),
            Self::OrphanHolder { holder, group } => {
                write!(f, "{holder} is not listed in its parent {group}")
            }
            Self::OwnershipMismatch { holder, group } => {
                write!(f, "ownership of {group} by {holder} is inconsistent")
            }
            Self::OwnershipCycle(node) => write!(f, "ownership cycle through {node}"),
            Self::DuplicateName { group, name } => {
                write!(f, "duplicate holder name `{name}` in {group}")
            }
            Self::MissingReferenceTarget { holder, target } => {
                write!(f, "{holder} references missing {target}")
            }
        }
    }
}

impl Error for IntegrityError {}

impl ConstructorForest {
    /// Verifies every structural invariant of the loaded forest.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        for area in self.areas() {
            if let Some(root) = area.constructor_group_id {
                let group = self.group(root).ok_or(IntegrityError::MissingRootGroup {
                    area: area.id,
                    group: root,
                })?;
                if group.parent_holder_id.is_some() {
                    return Err(IntegrityError::RootGroupHasOwner {
                        area: area.id,
                        group: root,
                    });
                }
            }
        }

        for group in self.groups() {
            let mut names = HashSet::new();
            for child in &group.children {
                let holder = self.holder(*child).ok_or(IntegrityError::MissingChild {
                    group: group.id,
                    holder: *child,
                })?;
                if holder.parent_group_id != group.id {
                    return Err(IntegrityError::ParentMismatch {
                        holder: holder.id,
                        listed_in: group.id,
                        recorded: holder.parent_group_id,
                    });
                }
                if !names.insert(holder.name.as_str()) {
                    return Err(IntegrityError::DuplicateName {
                        group: group.id,
                        name: holder.name.clone(),
                    });
                }
            }

            if let Some(owner) = group.parent_holder_id {
                let owns = self
                    .holder(owner)
                    .is_some_and(|holder| holder.sub_object == Some(SubObject::Group(group.id)));
                if !owns {
                    return Err(IntegrityError::OwnershipMismatch {
                        holder: owner,
                        group: group.id,
                    });
                }
            }
        }

        for holder in self.holders() {
            let listed = self
                .group(holder.parent_group_id)
                .is_some_and(|group| group.children.contains(&holder.id));
            if !listed {
                return Err(IntegrityError::OrphanHolder {
                    holder: holder.id,
                    group: holder.parent_group_id,
                });
            }
            match holder.sub_object {
                Some(SubObject::Group(group)) => {
                    let owned = self
                        .group(group)
                        .is_some_and(|item| item.parent_holder_id == Some(holder.id));
                    if !owned {
                        return Err(IntegrityError::OwnershipMismatch {
                            holder: holder.id,
                            group,
                        });
                    }
                }
                Some(SubObject::Ref(target)) => {
                    if self.group(target).is_none() {
                        return Err(IntegrityError::MissingReferenceTarget {
                            holder: holder.id,
                            target,
                        });
                    }
                }
                None => {}
            }
        }

        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<(), IntegrityError> {
        for holder in self.holders() {
            let start = NodeRef::holder(holder.id);
            let mut visited = HashSet::new();
            let mut cursor = Some(start);
            while let Some(current) = cursor {
                if !visited.insert(current) {
                    return Err(IntegrityError::OwnershipCycle(start));
                }
                cursor = self.parent_of(current);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::IntegrityError;
    use crate::model::constructor::SubObject;
    use crate::model::ids::{GroupId, HolderId};
    use crate::model::node::NodeRef;
    use crate::tree::forest::fixtures::{group, holder, sample_forest};

    #[test]
    fn sample_forest_is_consistent() {
        sample_forest()
            .check_integrity()
            .expect("fixture should satisfy invariants");
    }

    #[test]
    fn duplicate_sibling_names_are_rejected() {
        let mut forest = sample_forest();
        forest.insert_group(group(1, None, &[1, 2, 4, 6]));
        forest.insert_holder(holder(6, "A", 1, None));

        let err = forest.check_integrity().unwrap_err();
        assert_eq!(
            err,
            IntegrityError::DuplicateName {
                group: GroupId(1),
                name: "A".to_string()
            }
        );
    }

    #[test]
    fn dangling_reference_is_rejected() {
        let mut forest = sample_forest();
        forest.insert_holder(holder(2, "B", 1, Some(SubObject::Ref(GroupId(42)))));

        let err = forest.check_integrity().unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::MissingReferenceTarget { holder, target }
                if holder == HolderId(2) && target == GroupId(42)
        ));
    }

    #[test]
    fn ownership_cycle_is_detected() {
        let mut forest = sample_forest();
        // E owns group#2, which (through C and group#3) owns E again.
        forest.insert_group(group(2, Some(5), &[3]));
        forest.insert_holder(holder(5, "E", 3, Some(SubObject::Group(GroupId(2)))));
        forest.insert_holder(holder(1, "A", 1, None));

        let err = forest.check_integrity().unwrap_err();
        assert!(matches!(err, IntegrityError::OwnershipCycle(NodeRef::Holder { .. })));
    }
}
