//! Command line interface

pub mod serve;

use clap::{Parser, Subcommand};

/// Storefront API - accounts, sessions, addresses and catalogue
#[derive(Parser)]
#[command(name = "storefront-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the API under /api, uploaded images and the front-end
    Serve(serve::ServeArgs),
}
