//! Persistence gateway contract for constructor trees.
//!
//! # Responsibility
//! - Define the load/save operations the editor is allowed to use.
//! - Define the typed failure kinds every implementation reports.
//!
//! # Invariants
//! - IDs are allocated by the gateway on insert.
//! - Every call is synchronous and reports success or one typed failure.
//! - Failures are not retried by callers within one user action.

use crate::db::DbError;
use crate::model::constructor::{Area, ConstructorGroup, ConstructorHolder, NewGroup, NewHolder};
use crate::model::ids::{AreaId, GroupId, HolderId};
use crate::model::node::NodeRef;
use crate::tree::clone::ClonedHolder;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failure kind without the message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    NotFound,
    DuplicateKey,
    ConstraintViolation,
    ConnectionFailure,
}

/// Typed gateway failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Addressed entity does not exist.
    NotFound(String),
    /// Unique key (e.g. sibling name) already taken.
    DuplicateKey(String),
    /// Foreign key, check constraint or persisted-shape violation.
    ConstraintViolation(String),
    /// Storage is unreachable or failed below the data layer.
    ConnectionFailure(String),
}

impl GatewayError {
    pub fn kind(&self) -> GatewayErrorKind {
        match self {
            Self::NotFound(_) => GatewayErrorKind::NotFound,
            Self::DuplicateKey(_) => GatewayErrorKind::DuplicateKey,
            Self::ConstraintViolation(_) => GatewayErrorKind::ConstraintViolation,
            Self::ConnectionFailure(_) => GatewayErrorKind::ConnectionFailure,
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::DuplicateKey(message) => write!(f, "duplicate key: {message}"),
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::ConnectionFailure(message) => write!(f, "connection failure: {message}"),
        }
    }
}

impl Error for GatewayError {}

impl From<rusqlite::Error> for GatewayError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound(value.to_string()),
            rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
                match err.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        Self::DuplicateKey(value.to_string())
                    }
                    _ => Self::ConstraintViolation(value.to_string()),
                }
            }
            _ => Self::ConnectionFailure(value.to_string()),
        }
    }
}

impl From<DbError> for GatewayError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::ConnectionFailure(other.to_string()),
        }
    }
}

/// Flat records of one area tree as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedTree {
    pub root: GroupId,
    /// Groups owned by the tree, root included.
    pub groups: Vec<ConstructorGroup>,
    pub holders: Vec<ConstructorHolder>,
}

/// Storage operations consumed by the constructor editor.
pub trait ConstructorGateway {
    /// Creates an area without a constructor tree.
    fn insert_area(&self, name: &str) -> GatewayResult<AreaId>;
    /// Lists every area in ascending id order.
    fn list_areas(&self) -> GatewayResult<Vec<Area>>;
    /// Loads one area, `None` when it does not exist.
    fn load_area(&self, area: AreaId) -> GatewayResult<Option<Area>>;
    /// Deletes an area together with the tree it owns.
    fn remove_area(&self, area: AreaId) -> GatewayResult<()>;

    /// Loads the tree owned by `area`; `None` when the area has no root group.
    fn load_constructor_tree(&self, area: AreaId) -> GatewayResult<Option<LoadedTree>>;
    fn insert_constructor_group(&self, group: &NewGroup) -> GatewayResult<GroupId>;
    /// Appends a holder to its parent group.
    fn insert_constructor_holder(&self, holder: &NewHolder) -> GatewayResult<HolderId>;
    /// Deep-inserts a cloned holder subtree under `parent`.
    fn insert_constructor_holder_sub_tree(
        &self,
        parent: GroupId,
        holder: &ClonedHolder,
    ) -> GatewayResult<HolderId>;
    /// Reparents one holder, appending it to `group`.
    fn update_constructor_holder_group_id(
        &self,
        holder: HolderId,
        group: GroupId,
    ) -> GatewayResult<()>;
    /// Reparents several holders, preserving their relative order.
    ///
    /// The default implementation issues one call per holder and is not
    /// atomic: when a call fails, earlier holders stay moved. Implementations
    /// with transactions should override it.
    fn update_constructor_holders_group_id(
        &self,
        holders: &[HolderId],
        group: GroupId,
    ) -> GatewayResult<()> {
        for holder in holders {
            self.update_constructor_holder_group_id(*holder, group)?;
        }
        Ok(())
    }
    fn update_constructor_holder_sub_reference(
        &self,
        holder: HolderId,
        target: Option<GroupId>,
    ) -> GatewayResult<()>;
    fn update_constructor_holder_sub_group_id(
        &self,
        holder: HolderId,
        group: Option<GroupId>,
    ) -> GatewayResult<()>;
    fn update_area_constructor_group(
        &self,
        area: AreaId,
        group: Option<GroupId>,
    ) -> GatewayResult<()>;
    /// Deletes a node and everything it owns. Referenced groups survive.
    fn remove_constructor_object_with_sub_tree(&self, node: NodeRef) -> GatewayResult<()>;
    /// Writes name and scalar properties of `holder`.
    fn update_constructor_holder_properties(&self, holder: &ConstructorHolder)
        -> GatewayResult<()>;
}
