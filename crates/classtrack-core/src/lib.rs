//! # ClassTrack Core
//! Shared data model, error type, configuration, and the record-store
//! contract every other crate builds on.

pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod ui;

pub use config::BotConfig;
pub use error::{ClassTrackError, Result};
pub use store::{RecordStore, StudentMap};
pub use types::{AuditEvent, ClassStatus, LogEntry, StatusLog, StudentRecord};
pub use ui::{Button, Keyboard, Render};
