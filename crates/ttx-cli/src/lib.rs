//! Timetable extractor CLI library.
//!
//! This crate provides the `ttx` command-line interface over `ttx-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
