//! CLI tool for inspecting consistent hash rings.
//!
//! Provides commands for:
//! - Looking up the nodes responsible for keys
//! - Dumping the ring layout with replica owners
//! - Inspecting the neighbours of a key's position

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
