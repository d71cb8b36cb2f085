//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into presentation-facing APIs.
//! - Keep UI layers decoupled from storage details.

pub mod inventory_controller;
pub mod scope;
