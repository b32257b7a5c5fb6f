//! # Logwire
//!
//! Logging channels assembled from declarative configuration.
//!
//! A configuration names formatters, processors and handlers by id, and
//! channels that tie handlers and processors together. Nothing is built up
//! front: each component is constructed the first time something asks for it,
//! then reused.
//!
//! ## Features
//!
//! - Components built from registered factories with named, defaulted
//!   parameters (`camelCase` or `snake_case` keys)
//! - References between entries validated when the configuration is parsed
//! - Built-in line/JSON formatters, stream/memory/tracing handlers, and
//!   rotating files behind the `file` feature
//! - Configuration loads through `serde` from JSON, YAML or TOML
//!
//! ## Example
//!
//! ```rust
//! use logwire::{Logwire, RawConfig};
//! use serde_json::json;
//!
//! let raw = RawConfig::from_value(json!({
//!     "formatters": {"plain": {"formatter": "line", "format": "%level_name%: %message%"}},
//!     "handlers": {"console": {"handler": "stream", "stream": "stderr", "formatter": "plain"}},
//!     "channels": {"app": {"handlers": ["console"]}},
//!     "default": "app",
//! }))?;
//!
//! let logwire = Logwire::new(raw)?;
//! logwire.default_logger()?.info("ready")?;
//! # Ok::<(), logwire::Error>(())
//! ```

pub mod binder;
pub mod builder;
pub mod builtin;
pub mod case;
pub mod channel;
pub mod component;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod facade;
pub mod logger;
pub mod record;
pub mod registry;
pub mod types;

/// Named arguments of a configuration entry.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

pub use binder::{BoundArgs, Param, TypeRegistry};
pub use builder::LogwireBuilder;
pub use channel::ChannelDescriptor;
pub use component::{Formatter, Handler, Processor};
pub use config::RawConfig;
pub use diagnostics::init_diagnostics;
pub use error::{Error, Result};
pub use facade::{LoggerCache, Logwire, MemoryCache, global_cache};
pub use logger::Logger;
pub use record::{Level, Record};
pub use registry::Registry;
pub use types::{Kind, Types};

/// Start building a [`Logwire`] facade.
pub fn builder() -> LogwireBuilder {
    LogwireBuilder::new()
}
