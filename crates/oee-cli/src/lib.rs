//! OEE signal engine CLI library.
//!
//! This crate provides the CLI interface for the signal engine.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
