//! Constructor editing services.
//!
//! # Responsibility
//! - Orchestrate validated edits over the gateway.
//! - Keep interaction and view state out of the storage layer.

pub mod editor;
pub mod error;
pub mod interaction;
pub mod paste;
pub mod view_state;
