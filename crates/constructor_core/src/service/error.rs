//! Editor error types.
//!
//! # Responsibility
//! - Separate in-memory validation failures from storage failures.
//! - Keep the original gateway failure kind visible to callers.

use crate::model::ids::{GroupId, HolderId};
use crate::model::node::NodeRef;
use crate::repo::gateway::GatewayError;
use crate::tree::integrity::IntegrityError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Failure detected before any gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A sibling in `group` already uses `name`.
    DuplicateName { group: GroupId, name: String },
    /// Moving `node` under `target` would place it below itself.
    CycleDetected { node: NodeRef, target: NodeRef },
    /// Paste target is not a group.
    InvalidPasteTarget(NodeRef),
    /// Holder already owns a group or a reference.
    SubObjectExists(HolderId),
    /// Operation needs the target of a link that does not resolve.
    BrokenLinkEditAttempt { link: HolderId, target: HolderId },
    /// Name is blank after trim.
    InvalidName,
    /// Node does not resolve in the loaded forest.
    NodeNotFound(NodeRef),
    /// Move target is not a group.
    InvalidMoveTarget(NodeRef),
    /// Reference target is missing or inside the holder's own subtree.
    InvalidReferenceTarget { holder: HolderId, target: GroupId },
    /// Link holders mirror their target and own nothing.
    LinkHolderHasNoSubObject(HolderId),
    /// Removing the root of an area tree needs explicit confirmation.
    RootRemovalNotConfirmed(NodeRef),
    /// Name resolver gave up on a colliding name.
    PasteAbandoned { name: String },
    /// Operation is not defined for this node kind.
    UnsupportedNode(NodeRef),
    /// Clipboard is empty.
    NothingToPaste,
    /// Pasted content references a group that is gone.
    MissingReferenceTarget(GroupId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName { group, name } => {
                write!(f, "name `{name}` is already used in {group}")
            }
            Self::CycleDetected { node, target } => {
                write!(f, "moving {node} under {target} would create a cycle")
            }
            Self::InvalidPasteTarget(target) => {
                write!(f, "cannot paste into {target}; target must be a group")
            }
            Self::SubObjectExists(holder) => {
                write!(f, "{holder} already has a sub-object")
            }
            Self::BrokenLinkEditAttempt { link, target } => {
                write!(f, "link {link} points at missing {target}")
            }
            Self::InvalidName => write!(f, "name must not be blank"),
            Self::NodeNotFound(node) => write!(f, "node not found: {node}"),
            Self::InvalidMoveTarget(target) => {
                write!(f, "cannot move into {target}; target must be a group")
            }
            Self::InvalidReferenceTarget { holder, target } => {
                write!(f, "{holder} cannot reference {target}")
            }
            Self::LinkHolderHasNoSubObject(holder) => {
                write!(f, "link {holder} cannot own a sub-object")
            }
            Self::RootRemovalNotConfirmed(node) => {
                write!(f, "removing {node} deletes the area tree and must be confirmed")
            }
            Self::PasteAbandoned { name } => {
                write!(f, "paste abandoned at colliding name `{name}`")
            }
            Self::UnsupportedNode(node) => {
                write!(f, "operation not supported for {} {node}", node.kind_label())
            }
            Self::NothingToPaste => write!(f, "clipboard is empty"),
            Self::MissingReferenceTarget(group) => {
                write!(f, "pasted content references missing {group}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Errors from constructor editor operations.
#[derive(Debug)]
pub enum EditorError {
    /// Request rejected in memory; storage untouched.
    Validation(ValidationError),
    /// Gateway call failed; the forest was reloaded afterwards.
    Persistence(GatewayError),
    /// Session area, or a node known before the last reload, no longer
    /// resolves.
    StaleReference(NodeRef),
    /// Reloaded data violates a structural invariant.
    Integrity(IntegrityError),
}

impl EditorError {
    /// Validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "persistence failed: {err}"),
            Self::StaleReference(node) => write!(f, "stale reference: {node} no longer exists"),
            Self::Integrity(err) => write!(f, "integrity check failed: {err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::StaleReference(_) => None,
        }
    }
}

impl From<ValidationError> for EditorError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GatewayError> for EditorError {
    fn from(value: GatewayError) -> Self {
        Self::Persistence(value)
    }
}

impl From<IntegrityError> for EditorError {
    fn from(value: IntegrityError) -> Self {
        Self::Integrity(value)
    }
}
