//! Session module for meetlink
//!
//! The session draft that a provisioning attempt reads from and writes to.

mod models;

pub use models::{SessionDraft, SessionType};
