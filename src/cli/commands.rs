//! CLI command implementations

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::cli::args::ConfigCommand;
use crate::config::Settings;
use crate::meeting::{
    BrowserPresenter, Cancellation, MeetingService, MeetingServiceClient, Notice, Notifier,
    ProvisionAttempt, Provisioner, Resolution, ResultResolver,
};
use crate::session::{SessionDraft, SessionType};

/// Prints notices to stdout
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: &Notice) {
        println!("{}", notice);
    }
}

/// Parsed `provision` arguments
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub session_type: SessionType,
    pub start: String,
    pub participants: Vec<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub request_id: Option<String>,
    pub no_browser: bool,
    pub json: bool,
}

/// Prepare a session for creation
pub async fn provision_session(settings: &Settings, options: ProvisionOptions) -> Result<()> {
    let start = parse_start(&options.start)?;

    let mut draft = SessionDraft::new(options.session_type);
    draft.summary = options.summary;
    draft.location = options.location;

    let resolution = match options.session_type {
        SessionType::Physical => {
            ResultResolver::from_settings(settings, Arc::new(ConsoleNotifier))
                .resolve_physical(&mut draft)
        }
        SessionType::Virtual => {
            let service = MeetingServiceClient::from_settings(settings)?;

            let mut presenter = BrowserPresenter::new().with_poll_interval(settings.poll_interval());
            if options.no_browser {
                presenter = presenter.print_only();
            }

            let provisioner = Provisioner::from_settings(
                settings,
                Arc::new(service),
                Arc::new(presenter),
                Arc::new(ConsoleNotifier),
            );

            let request_id = options
                .request_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let attempt =
                ProvisionAttempt::new(options.participants, start).with_request_id(request_id);

            let (canceller, mut cancellation) = Cancellation::channel();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    canceller.cancel();
                }
            });

            provisioner
                .provision(&mut draft, &attempt, &mut cancellation)
                .await
        }
    };

    if let Resolution::Abort { .. } = resolution {
        anyhow::bail!("Session was not created");
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&draft)?);
        return Ok(());
    }

    println!("Start: {}", start.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    if let Some(link) = draft.meeting_link.as_deref() {
        println!("Meeting link: {}", link);
    }
    if let Some(location) = draft.location.as_deref() {
        println!("Location: {}", location);
    }

    Ok(())
}

/// Report whether the meeting service holds calendar access for this user
pub async fn check_auth(settings: &Settings) -> Result<()> {
    let client = MeetingServiceClient::from_settings(settings)?;

    let authorized = client
        .check_authorization()
        .await
        .context("Failed to query authorization status")?;

    if authorized {
        println!("Authorized with the meeting provider");
    } else {
        println!("Not authorized. Run `meetlink provision` for a virtual session to start authorization.");
    }

    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(&settings.redacted())?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

#[derive(Serialize)]
struct DoctorReport {
    service_url: String,
    checks: Vec<DoctorCheck>,
    notes: Vec<String>,
}

/// Run diagnostic checks to help troubleshoot local setup issues.
pub async fn run_doctor(settings: &Settings, json: bool) -> Result<()> {
    let report = collect_doctor_report(settings);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("meetlink doctor");
    println!("service: {}", report.service_url);
    println!();

    for check in &report.checks {
        println!("{:<10} {:<8} {}", check.name, check.status, check.detail);
    }

    if !report.notes.is_empty() {
        println!();
        for note in &report.notes {
            println!("{}", note);
        }
    }

    Ok(())
}

fn collect_doctor_report(settings: &Settings) -> DoctorReport {
    let presenter = BrowserPresenter::new();
    let opener_ok = command_exists(presenter.opener());
    let token_ok = !settings.auth.token.trim().is_empty();
    let url_ok = reqwest::Url::parse(&settings.create_url()).is_ok();

    let mut notes = Vec::new();
    if !token_ok {
        notes.push(
            "hint: set auth.token in config or MEETLINK_AUTH_TOKEN before provisioning virtual sessions."
                .to_string(),
        );
    }
    if !opener_ok {
        notes.push(
            "hint: no URL opener found; use `meetlink provision --no-browser` and open the printed URL yourself."
                .to_string(),
        );
    }
    if settings.service.verify_after_close {
        notes.push("info: authorization status is checked after the consent page closes.".to_string());
    }

    DoctorReport {
        service_url: settings.create_url(),
        checks: vec![
            DoctorCheck {
                name: "opener",
                status: if opener_ok { "ok" } else { "missing" },
                detail: format!("{} launches the consent page", presenter.opener()),
            },
            DoctorCheck {
                name: "token",
                status: if token_ok { "ok" } else { "missing" },
                detail: "bearer credential for the meeting service".to_string(),
            },
            DoctorCheck {
                name: "service",
                status: if url_ok { "ok" } else { "invalid" },
                detail: "meeting creation endpoint URL".to_string(),
            },
        ],
        notes,
    }
}

// Helper functions

fn command_exists(bin: &str) -> bool {
    Command::new(bin)
        .arg("--help")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Parse an RFC 3339 timestamp, or `YYYY-MM-DD HH:MM` in local time
pub fn parse_start(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M").with_context(|| {
        format!(
            "Invalid start time '{}'. Use RFC 3339 or \"YYYY-MM-DD HH:MM\".",
            input
        )
    })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("Start time '{}' does not exist in the local timezone", input))
}
