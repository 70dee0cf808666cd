//! CLI interface for FarmTwin

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "farmtwin")]
#[command(version)]
#[command(about = "FarmTwin 360 session and navigation client", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides farmtwin.toml)
    #[arg(long, global = true, env = "FARMTWIN_API_URL")]
    pub api_url: Option<String>,

    /// Session store file (overrides farmtwin.toml)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default farmtwin.toml in the current directory
    Init,

    /// Log in and cache the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "FARMTWIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Clear the cached session
    Logout,

    /// Show the current session
    Status {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show reachable tabs and screens
    Nav {
        /// Role to inspect (defaults to the logged-in user's role)
        #[arg(short, long)]
        role: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Fetch the logged-in user's profile from the backend
    Profile,

    /// Authenticated GET of an API path, printed as JSON
    Get {
        /// Path below the API base URL, e.g. /dashboard/stats
        path: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
