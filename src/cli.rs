//! Command-line interface definition for Sessionward
//!
//! This module defines the CLI structure using clap's derive API. Every
//! subcommand operates on the session persisted by the configured storage
//! backend, so `local` or `keyring` storage is needed for tokens to survive
//! between invocations.

use clap::{Parser, Subcommand};

/// Sessionward - bearer token session management from the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "sessionward")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sessionward.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Sessionward
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the returned tokens
    Login {
        /// Account name sent as `username`
        #[arg(short, long)]
        username: String,

        /// Password sent as `password`; read from stdin when omitted
        #[arg(short, long, env = "SESSIONWARD_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Drop the stored tokens
    Logout,

    /// Show whether a session is active
    Status,

    /// Fetch and print the profile of the logged-in user
    Whoami,

    /// Exchange the refresh token for a new access token
    Refresh,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
