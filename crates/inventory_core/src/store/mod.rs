//! Async persistence contract with observable queries.
//!
//! # Responsibility
//! - Offer non-blocking CRUD and live read streams to the controller.
//! - Translate table writes into change notifications for observers.

pub mod item_store;
