//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define synchronous data access contracts over one connection.
//! - Isolate SQLite query details from the async store and controller.
//!
//! # Invariants
//! - Repositories only run against connections stamped with the current
//!   schema version.

pub mod item_repo;
