//! Browsing history analytics CLI library.
//!
//! This crate provides the CLI interface around `trail-core`: CSV loading,
//! configuration, and report/export rendering.

mod cli;
pub mod commands;
mod config;
pub mod load;

pub use cli::{Cli, Commands, ExportTable};
pub use config::Config;
