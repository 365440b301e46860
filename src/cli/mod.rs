//! CLI module for the document-search gateway

pub mod serve;

use clap::{Parser, Subcommand};

/// Document-search gateway - credential validation, rate limiting and usage
/// accounting in front of a search backend
#[derive(Parser)]
#[command(name = "docsearch-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the gateway server
    Serve,
}
