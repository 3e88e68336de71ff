//! Tooling & Integration Layer
//!
//! Command-line front end for the settings and coordination layer.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
