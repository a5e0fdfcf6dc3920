use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "shop-ask")]
#[command(about = "Answer analytics questions about a store")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Ask a question in plain language
    Ask {
        #[arg(long, default_value = "demo-store")]
        store_id: String,

        /// Print the full response as JSON, including debug info
        #[arg(long)]
        json: bool,

        question: String,
    },

    /// Validate and fetch a hand-written query
    Query {
        #[arg(long, default_value = "demo-store")]
        store_id: String,

        query: String,
    },
}
