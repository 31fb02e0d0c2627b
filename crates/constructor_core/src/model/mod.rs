//! Constructor tree domain model.
//!
//! # Responsibility
//! - Define areas, constructor groups, holders and their sub-objects.
//! - Keep every structural edge expressed as an ID reference.
//!
//! # Invariants
//! - IDs are allocated by the persistence gateway and never reused.
//! - A holder owns at most one sub-object: an owned group or a reference.
//! - Node objects are rebuilt on every reload; only IDs are stable.

pub mod constructor;
pub mod ids;
pub mod node;
