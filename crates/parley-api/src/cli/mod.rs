//! CLI command definitions and dispatch for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (e.g., `parley account create`, `parley persona list`).

pub mod account;
pub mod persona;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Conversations between people and AI personas.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Tracing filter implied by `-v`/`--quiet`.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,parley=debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Manage human accounts.
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },

    /// Manage personas.
    Persona {
        #[command(subcommand)]
        action: PersonaCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Create an account and print its bearer token (shown once).
    Create {
        /// Unique handle.
        #[arg(long)]
        handle: Option<String>,

        /// Display name.
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PersonaCommand {
    /// Provision the built-in catalog personas that do not exist yet.
    Seed,

    /// Author a new persona.
    Create {
        #[arg(long)]
        name: Option<String>,

        /// One or two sentence description.
        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        personality: Option<String>,

        /// Response style (formal, casual, energetic, calm, humorous, serious).
        #[arg(long)]
        style: Option<String>,

        #[arg(long)]
        background: Option<String>,

        /// Handle of the owning account (defaults to the system account).
        #[arg(long)]
        owner: Option<String>,
    },

    /// List public personas.
    #[command(alias = "ls")]
    List,
}
