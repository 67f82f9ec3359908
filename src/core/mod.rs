//! Core library components.
//!
//! Record classification, merging, loading and aggregation, plus the
//! backend gateway they run against. Nothing here reads the process
//! environment or writes to the terminal.

pub mod aggregate;
pub mod backend;
pub mod config;
pub mod constants;
pub mod env;
pub mod loader;
pub mod merge;
pub mod record;
pub mod render;
pub mod settings;
pub mod transit;
pub mod types;
pub mod validation;
