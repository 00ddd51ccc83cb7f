//! Command-line interface for the FFE tracker backend.

mod commands;

use clap::{Parser, Subcommand};

/// FFE Project Tracking System - account and settings backend
#[derive(Parser)]
#[command(name = "ffe-tracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "i")]
    Init,

    /// Apply migrations, reset settings and create the administrator
    Bootstrap {
        /// Reset the existing administrator's password and lock state
        #[arg(long)]
        force: bool,
    },
}

pub use commands::*;
