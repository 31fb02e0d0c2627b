//! Constructor forest: storage arena, navigation and read-only analysis.
//!
//! # Responsibility
//! - Hold one load of the constructor forest addressed by IDs.
//! - Provide traversal, integrity checks, link resolution and cloning.
//!
//! # Invariants
//! - Nothing in this module talks to the persistence gateway.
//! - Ownership and reference edges are kept as separate relations.

pub mod clone;
pub mod forest;
pub mod integrity;
pub mod links;
pub mod render;
