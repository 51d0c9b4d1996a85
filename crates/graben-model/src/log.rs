// ── Scene log records ──
//
// The scene's log sink emits these as first-class values so a UI layer on
// another thread can observe them without sharing a logger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a [`LogRecord`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// One entry from a scene's log sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Component that produced the record, e.g. `"graben::scene"`.
    pub target: String,
    pub message: String,
}

impl LogRecord {
    /// Build a record stamped with the current time.
    pub fn new(level: LogLevel, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            target: target.into(),
            message: message.into(),
        }
    }
}
