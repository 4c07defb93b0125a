//! Command-line interface for hookforge
//!
//! git calls the installed shims, which call `hookforge <hook>`; the config
//! subcommands are for humans inspecting what a hook would run.

pub mod commands;
mod output;

pub use commands::Cli;
pub use output::Output;
