//! Constructor tree engine.
//! Owns the tree model, its structural invariants and every edit applied
//! to it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tree;

pub use config::{ConfigError, EngineConfig, LogSettings};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::constructor::{
    Area, ConstructorGroup, ConstructorHolder, HolderPatch, HolderProperties, NewGroup, NewHolder,
    SubObject,
};
pub use model::ids::{AreaId, GroupId, HolderId};
pub use model::node::NodeRef;
pub use repo::gateway::{
    ConstructorGateway, GatewayError, GatewayErrorKind, GatewayResult, LoadedTree,
};
pub use repo::sqlite_gateway::SqliteConstructorGateway;
pub use service::editor::ConstructorEditor;
pub use service::error::{EditorError, EditorResult, ValidationError};
pub use service::interaction::{PendingCommit, PendingInteraction};
pub use service::paste::{AbandonOnCollision, NameResolver, NumberedCopies};
pub use service::view_state::SessionViewState;
pub use tree::clone::{ClonedGroup, ClonedHolder, ClonedNode, ClonedSubObject};
pub use tree::forest::ConstructorForest;
pub use tree::integrity::IntegrityError;
pub use tree::links::{LinkResolution, LinkState, DEFAULT_BROKEN_LINK_PLACEHOLDER};
pub use tree::render::render_outline;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
