#![forbid(unsafe_code)]

//! Core domain model and regimen search for warfarin weekly dosing.
//!
//! This crate provides:
//! - Domain types (calculation input, day schedules, regimen options)
//! - Tablet inventory and the per-call tablet set
//! - Day-pattern enumeration and tablet decomposition
//! - Regimen assembly, dispensing summaries and ranking
//! - Configuration and logging setup for hosts

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod decompose;
pub mod pattern;
pub mod regimen;
pub mod dispense;
pub mod ranker;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_inventory, TabletInventory, TabletSet, TabletSpec};
pub use config::{Config, SearchLimits};
pub use engine::{generate_suggestions, generate_suggestions_with};
