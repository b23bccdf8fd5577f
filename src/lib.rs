//! meetlink - Meeting link provisioning for scheduled sessions
//!
//! Creates a remote meeting for virtual sessions through a meeting service
//! that may first require the user to grant access in a browser.

pub mod cli;
pub mod config;
pub mod meeting;
pub mod session;

use thiserror::Error;

pub use meeting::ProvisionError;

/// Main error type for meetlink
#[derive(Error, Debug)]
pub enum MeetlinkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MeetlinkError>;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "meetlink";
