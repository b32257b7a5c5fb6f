use thiserror::Error as ThisError;

use crate::types::Kind;

/// Errors that can occur while building or using logging channels
#[derive(ThisError, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Configuration is malformed.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Initialization failed.
    #[error("Initialization error: {0}")]
    Init(String),
    #[error("Time error: {0}")]
    Time(#[from] time::error::Error),
    /// A required constructor parameter has no configured value and no default.
    #[error("No value configured for parameter `{parameter}` of type `{type_name}`")]
    MissingArgument {
        parameter: String,
        type_name: String,
    },
    /// A constructor parameter has a value of the wrong shape.
    #[error("Invalid value for parameter `{parameter}` of type `{type_name}`: {reason}")]
    InvalidArgument {
        parameter: String,
        type_name: String,
        reason: String,
    },
    /// No factory is registered under the type name.
    #[error("No {kind} type named `{name}` is registered")]
    UnknownType { kind: Kind, name: String },
    /// Lookup of an id that is not present in a namespace.
    #[error("No {namespace} with id `{id}`")]
    UnknownIdentifier { namespace: Kind, id: String },
    #[error("Formatter {0} not configured")]
    UnconfiguredFormatter(String),
    #[error("Processor {0} not configured")]
    UnconfiguredProcessor(String),
    #[error("Handler {0} not configured")]
    UnconfiguredHandler(String),
    #[error("No channel named '{0}' found")]
    UnknownChannel(String),
    #[error("No default channel configured")]
    NoDefaultConfigured,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
