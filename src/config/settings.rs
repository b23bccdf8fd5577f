//! Application settings management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// General settings
    #[serde(default)]
    pub general: GeneralSettings,

    /// Meeting service connection settings
    #[serde(default)]
    pub service: ServiceSettings,

    /// Credential settings
    #[serde(default)]
    pub auth: AuthSettings,

    /// Meeting request defaults
    #[serde(default)]
    pub meeting: MeetingSettings,

    /// Authorization window settings
    #[serde(default)]
    pub window: WindowSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL of the meeting service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the meeting creation endpoint
    #[serde(default = "default_create_path")]
    pub create_path: String,

    /// Path of the authorization status endpoint
    #[serde(default = "default_check_auth_path")]
    pub check_auth_path: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Ask the service whether authorization went through once the window closes
    #[serde(default)]
    pub verify_after_close: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Bearer token for the meeting service
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingSettings {
    /// Summary used when the session has none
    #[serde(default = "default_summary")]
    pub summary: String,

    /// Meeting description
    #[serde(default = "default_description")]
    pub description: String,

    /// Timezone identifier sent with every request
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Domain used for placeholder attendee addresses
    #[serde(default = "default_attendee_domain")]
    pub attendee_domain: String,

    /// Location used for physical sessions without one
    #[serde(default = "default_location")]
    pub default_location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    /// Authorization window title
    #[serde(default = "default_window_title")]
    pub title: String,

    /// Window width in pixels
    #[serde(default = "default_window_width")]
    pub width: u32,

    /// Window height in pixels
    #[serde(default = "default_window_height")]
    pub height: u32,

    /// How often to check whether the window closed, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long to wait for the window before giving up, in seconds
    #[serde(default = "default_window_timeout_secs")]
    pub timeout_secs: u64,
}

// Default value functions

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://vidyasangam.duckdns.org".to_string()
}

fn default_create_path() -> String {
    "/api/utility/create-meet".to_string()
}

fn default_check_auth_path() -> String {
    "/api/utility/check-auth".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_summary() -> String {
    "Mentoring Session".to_string()
}

fn default_description() -> String {
    "Scheduled mentoring session".to_string()
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_attendee_domain() -> String {
    "example.com".to_string()
}

fn default_location() -> String {
    "To be determined".to_string()
}

fn default_window_title() -> String {
    "Google Authorization".to_string()
}

fn default_window_width() -> u32 {
    800
}

fn default_window_height() -> u32 {
    600
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_window_timeout_secs() -> u64 {
    300
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            create_path: default_create_path(),
            check_auth_path: default_check_auth_path(),
            request_timeout_secs: default_request_timeout_secs(),
            verify_after_close: false,
        }
    }
}

impl Default for MeetingSettings {
    fn default() -> Self {
        Self {
            summary: default_summary(),
            description: default_description(),
            timezone: default_timezone(),
            attendee_domain: default_attendee_domain(),
            default_location: default_location(),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: default_window_title(),
            width: default_window_width(),
            height: default_window_height(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_window_timeout_secs(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            service: ServiceSettings::default(),
            auth: AuthSettings::default(),
            meeting: MeetingSettings::default(),
            window: WindowSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("No config file found, using defaults");
            let mut settings = Self::default();
            settings.apply_env_overrides();
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut settings = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        settings.apply_env_overrides();

        Ok(settings)
    }

    /// Parse settings from TOML text, filling in defaults for missing keys
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if self.auth.token.trim().is_empty() {
            if let Ok(token) = std::env::var("MEETLINK_AUTH_TOKEN") {
                if !token.trim().is_empty() {
                    self.auth.token = token;
                }
            }
        }

        if let Ok(url) = std::env::var("MEETLINK_SERVICE_URL") {
            if !url.trim().is_empty() {
                self.service.base_url = url;
            }
        }
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "meetlink", "meetlink")
            .context("Could not determine config directory")?;

        let config_dir = dirs.config_dir();
        Ok(config_dir.join("config.toml"))
    }

    /// Write default configuration to a file
    pub fn write_default(path: &PathBuf) -> Result<()> {
        let settings = Self::default();
        let content = toml::to_string_pretty(&settings)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Copy of the settings that is safe to print
    pub fn redacted(&self) -> Self {
        let mut settings = self.clone();
        if !settings.auth.token.is_empty() {
            settings.auth.token = "<redacted>".to_string();
        }
        settings
    }

    /// Full URL of the meeting creation endpoint
    pub fn create_url(&self) -> String {
        join_url(&self.service.base_url, &self.service.create_path)
    }

    /// Full URL of the authorization status endpoint
    pub fn check_auth_url(&self) -> String {
        join_url(&self.service.base_url, &self.service.check_auth_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.window.poll_interval_ms.max(1))
    }

    pub fn window_timeout(&self) -> Duration {
        Duration::from_secs(self.window.timeout_secs)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        path.trim().trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_window() {
        let settings = Settings::default();
        assert_eq!(settings.window.title, "Google Authorization");
        assert_eq!((settings.window.width, settings.window.height), (800, 600));
        assert_eq!(settings.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let settings = Settings::from_toml(
            r#"
[service]
base_url = "http://localhost:8000/"

[meeting]
timezone = "UTC"
"#,
        )
        .unwrap();

        assert_eq!(settings.meeting.timezone, "UTC");
        assert_eq!(settings.meeting.summary, "Mentoring Session");
        assert_eq!(
            settings.create_url(),
            "http://localhost:8000/api/utility/create-meet"
        );
        assert_eq!(
            settings.check_auth_url(),
            "http://localhost:8000/api/utility/check-auth"
        );
    }

    #[test]
    fn redacted_hides_token() {
        let mut settings = Settings::default();
        settings.auth.token = "secret-token".to_string();

        let shown = toml::to_string_pretty(&settings.redacted()).unwrap();
        assert!(!shown.contains("secret-token"));
        assert!(shown.contains("<redacted>"));
    }
}
