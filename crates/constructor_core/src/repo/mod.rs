//! Persistence gateway contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the storage operations the constructor editor depends on.
//! - Isolate SQLite query details from editor orchestration.
//!
//! # Invariants
//! - Gateway APIs return typed failures (`NotFound`, `DuplicateKey`, ...)
//!   rather than raw driver errors.

pub mod gateway;
pub mod sqlite_gateway;
