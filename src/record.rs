use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::Arguments;

/// Severity of a log record, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Level {
    /// Upper-case name as rendered by formatters.
    pub fn name(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Notice => "NOTICE",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Alert => "ALERT",
            Level::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "notice" => Ok(Level::Notice),
            "warn" | "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" => Ok(Level::Critical),
            "alert" => Ok(Level::Alert),
            "emergency" => Ok(Level::Emergency),
            other => Err(format!("unknown level: {}", other)),
        }
    }
}

/// A single log entry travelling through processors, formatters and handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Name of the channel that emitted the record.
    pub channel: String,
    pub level: Level,
    pub message: String,
    /// Caller-supplied structured data.
    pub context: Arguments,
    /// Data added by processors.
    pub extra: Arguments,
    pub datetime: OffsetDateTime,
}

impl Record {
    /// Create a record stamped with the current UTC time.
    pub fn new(channel: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            level,
            message: message.into(),
            context: Arguments::new(),
            extra: Arguments::new(),
            datetime: OffsetDateTime::now_utc(),
        }
    }

    /// Attach context data.
    pub fn with_context(mut self, context: Arguments) -> Self {
        self.context = context;
        self
    }
}
