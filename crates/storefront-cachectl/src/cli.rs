//! Command-line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Storefront cache control: build keys, inspect TTLs, invalidate entries
#[derive(Parser, Debug)]
#[command(name = "storefront-cachectl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding default.toml and the environment overrides
    #[arg(long, global = true, default_value = "./config")]
    pub config_dir: PathBuf,

    /// Environment name (defaults to STOREFRONT_ENVIRONMENT)
    #[arg(long, global = true)]
    pub environment: Option<String>,

    /// Use an in-process store instead of Redis
    #[arg(long, global = true)]
    pub memory: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the key and TTL for a category and its parameters
    Key {
        /// Category name, e.g. product-detail
        category: String,

        /// Parameters as a JSON object, e.g. '{"id": 42}'
        #[arg(long)]
        params: Option<String>,
    },

    /// Print the TTL of every category
    Ttl,

    /// Invalidate the entries affected by a change
    Invalidate {
        /// Event kind, e.g. product-changed
        kind: String,

        /// Changed resource id (a user id for cart and user events)
        id: Option<String>,

        /// User owning the order, for order and payment events
        #[arg(long)]
        owner: Option<String>,

        /// Print the patterns without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete every entry in the namespace
    Flush,

    /// Check that the store answers
    Ping,
}
