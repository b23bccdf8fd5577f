//! CLI argument definitions using clap

use clap::{Parser, Subcommand};

use crate::session::SessionType;

/// meetlink - Meeting link provisioning for scheduled sessions
#[derive(Parser, Debug)]
#[command(name = "meetlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare a session: create a meeting link (virtual) or fill in the location (physical)
    Provision {
        /// Session type
        #[arg(short = 't', long = "type", value_enum, default_value = "virtual")]
        session_type: SessionType,

        /// Start time (RFC 3339, or "YYYY-MM-DD HH:MM" in local time)
        #[arg(short, long)]
        start: String,

        /// Participant registration number (repeatable)
        #[arg(short, long = "participant")]
        participants: Vec<String>,

        /// Meeting summary
        #[arg(long)]
        summary: Option<String>,

        /// Location for physical sessions
        #[arg(short, long)]
        location: Option<String>,

        /// Conference request id (defaults to a fresh UUID)
        #[arg(long)]
        request_id: Option<String>,

        /// Print the URL instead of launching a browser
        #[arg(long)]
        no_browser: bool,

        /// Print the resulting session draft as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the meeting service whether calendar access is granted
    CheckAuth,

    /// Run diagnostic checks for local setup issues
    Doctor {
        /// Print diagnostic output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
