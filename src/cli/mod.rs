//! CLI module - Command-line interface for graphcache
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// graphcache - GraphQL read-through cache over the jsonplaceholder API
#[derive(Parser)]
#[command(name = "graphcache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the GraphQL gateway (default)
    #[command(alias = "daemon", alias = "-d")]
    Serve,

    /// Check that the upstream API and the cache store are reachable
    #[command(alias = "-c", alias = "--check")]
    Check,

    /// Resolve getTodos and print the joined result as JSON
    Todos,

    /// Resolve getUser for one id and print it as JSON
    User {
        /// User ID
        id: String,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
