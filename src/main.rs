//! meetlink - Meeting link provisioning for scheduled sessions
//!
//! Entry point for the meetlink CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use meetlink::cli::commands::ProvisionOptions;
use meetlink::cli::{Cli, Commands};
use meetlink::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        meetlink::cli::completions::print(shell);
        return Ok(());
    }

    // Load configuration only for runtime commands.
    let settings = Settings::load();

    // Initialize logging
    let default_level = if cli.verbose {
        "debug".to_string()
    } else {
        settings
            .as_ref()
            .map(|s| s.general.log_level.clone())
            .unwrap_or_else(|_| "info".to_string())
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let settings = settings?;

    // Execute command
    match cli.command {
        Commands::Provision {
            session_type,
            start,
            participants,
            summary,
            location,
            request_id,
            no_browser,
            json,
        } => {
            let options = ProvisionOptions {
                session_type,
                start,
                participants,
                summary,
                location,
                request_id,
                no_browser,
                json,
            };
            meetlink::cli::commands::provision_session(&settings, options).await?;
        }
        Commands::CheckAuth => {
            meetlink::cli::commands::check_auth(&settings).await?;
        }
        Commands::Doctor { json } => {
            meetlink::cli::commands::run_doctor(&settings, json).await?;
        }
        Commands::Config(config_cmd) => {
            meetlink::cli::commands::config_command(&settings, config_cmd)?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
