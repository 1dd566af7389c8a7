//! Tooling & Integration Layer
//!
//! CLI front end and text formatting for reports and listings.

pub mod cli;
pub mod format;

pub use cli::{Cli, CliContext, Commands};
