//! Builder for a [`Logwire`] facade.
//!
//! Collects configuration, custom component types, ready-made processors and
//! the logger cache in one chain, then parses everything at once.
//!
//! # Example
//!
//! ```rust
//! use logwire::{Level, Record};
//! use serde_json::json;
//!
//! let logwire = logwire::builder()
//!     .with_handler("mem", json!({"handler": "memory"}).as_object().cloned().unwrap())
//!     .with_processor("shout", |mut record: Record| {
//!         record.message = record.message.to_uppercase();
//!         record
//!     })
//!     .with_channel(
//!         "app",
//!         json!({"handlers": ["mem"], "processors": ["shout"]})
//!             .as_object()
//!             .cloned()
//!             .unwrap(),
//!     )
//!     .with_default("app")
//!     .build()?;
//!
//! assert!(logwire.default_logger()?.log(Level::Info, "hello", Default::default())?);
//! # Ok::<(), logwire::Error>(())
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::binder::{BoundArgs, Param};
use crate::facade::{LoggerCache, MemoryCache};
use crate::{Arguments, Formatter, Handler, Logwire, Processor, RawConfig, Registry, Result, Types};

/// A builder for configuring a [`Logwire`] facade.
pub struct LogwireBuilder {
    config: RawConfig,
    types: Types,
    instances: BTreeMap<String, Arc<dyn Processor>>,
    cache: Option<Arc<dyn LoggerCache>>,
}

impl LogwireBuilder {
    /// Empty configuration over the built-in types.
    pub fn new() -> Self {
        Self::from_config(RawConfig::new())
    }

    /// Start from an existing configuration.
    pub fn from_config(config: RawConfig) -> Self {
        Self {
            config,
            types: Types::default(),
            instances: BTreeMap::new(),
            cache: None,
        }
    }

    /// Add a formatter entry; `formatter` in `options` names its type.
    pub fn with_formatter(mut self, id: impl Into<String>, options: Arguments) -> Self {
        self.config = self.config.with_formatter(id, options);
        self
    }

    /// Add a handler entry; `handler` names its type, `formatter` and
    /// `processors` reference other entries.
    pub fn with_handler(mut self, id: impl Into<String>, options: Arguments) -> Self {
        self.config = self.config.with_handler(id, options);
        self
    }

    /// Configure a processor by type, like an entry of the `processors` map.
    pub fn with_processor_config(mut self, id: impl Into<String>, options: Arguments) -> Self {
        self.config = self.config.with_processor(id, options);
        self
    }

    /// Supply a ready-made processor under `id`.
    ///
    /// Configuration may still declare `id` without a type, in which case this
    /// instance is used as-is.
    pub fn with_processor(mut self, id: impl Into<String>, processor: impl Processor + 'static) -> Self {
        self.instances.insert(id.into(), Arc::new(processor));
        self
    }

    /// Add a channel listing its `handlers` and `processors` by id.
    pub fn with_channel(mut self, name: impl Into<String>, options: Arguments) -> Self {
        self.config = self.config.with_channel(name, options);
        self
    }

    /// Name the channel returned by [`Logwire::default_logger`].
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_default(name);
        self
    }

    /// Make a formatter type available to configuration under `name`.
    pub fn register_formatter_type<F>(mut self, name: impl Into<String>, params: &[Param], build: F) -> Self
    where
        F: Fn(&mut BoundArgs) -> Result<Box<dyn Formatter>> + Send + Sync + 'static,
    {
        self.types.formatters.register(name, params, build);
        self
    }

    /// Make a handler type available under `name`. The factory may take the
    /// handler's formatter and processors from its [`BoundArgs`].
    pub fn register_handler_type<F>(mut self, name: impl Into<String>, params: &[Param], build: F) -> Self
    where
        F: Fn(&mut BoundArgs) -> Result<Box<dyn Handler>> + Send + Sync + 'static,
    {
        self.types.handlers.register(name, params, build);
        self
    }

    /// Make a processor type available under `name`.
    pub fn register_processor_type<F>(mut self, name: impl Into<String>, params: &[Param], build: F) -> Self
    where
        F: Fn(&mut BoundArgs) -> Result<Box<dyn Processor>> + Send + Sync + 'static,
    {
        self.types.processors.register(name, params, build);
        self
    }

    /// Cache for assembled loggers. Defaults to a fresh [`MemoryCache`].
    pub fn with_cache(mut self, cache: Arc<dyn LoggerCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Parse the configuration without wrapping it in a facade.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry names an unknown type or references an
    /// id that is not configured.
    pub fn build_registry(self) -> Result<Registry> {
        Registry::with_types(self.config, self.types, self.instances)
    }

    /// Parse the configuration and wrap it in a facade.
    pub fn build(mut self) -> Result<Logwire> {
        let cache = self
            .cache
            .take()
            .unwrap_or_else(|| Arc::new(MemoryCache::new()));
        Ok(Logwire::from_registry(self.build_registry()?, cache))
    }
}

impl Default for LogwireBuilder {
    fn default() -> Self {
        Self::new()
    }
}
