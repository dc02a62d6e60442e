//! Command-line interface for parlor.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parlor - session server for two-player turn-based grid games.
#[derive(Parser, Debug)]
#[command(name = "parlor")]
#[command(about = "Session server for two-player turn-based grid games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Path to a TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Watch a session from the terminal (read-only polling)
    Watch {
        /// Game server URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,

        /// Session code to watch
        code: String,
    },

    /// Join a session and play it from the terminal
    Play {
        /// Game server URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,

        /// Session code to join (created first if omitted)
        #[arg(long)]
        code: Option<String>,

        /// Player name to join as
        player: String,
    },
}
