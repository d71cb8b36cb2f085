//! Domain model for inventory records.
//!
//! # Responsibility
//! - Define the item record shared by store, controller and presentation.
//! - Keep display concerns (currency rendering) next to the record.
//!
//! # Invariants
//! - The persistent store owns the canonical copy of every item; values held
//!   elsewhere are snapshots.

pub mod currency;
pub mod item;
