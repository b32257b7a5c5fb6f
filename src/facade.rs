//! Entry point for applications: named loggers on top of a [`Registry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;

use crate::builtin::Memory;
use crate::{Logger, RawConfig, Registry, Result};

/// Storage for assembled loggers, keyed by channel name.
pub trait LoggerCache: Send + Sync {
    fn has(&self, name: &str) -> bool;
    fn get(&self, name: &str) -> Option<Arc<Logger>>;
    fn put(&self, name: &str, logger: Arc<Logger>);
}

#[derive(Default)]
pub struct MemoryCache {
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoggerCache for MemoryCache {
    fn has(&self, name: &str) -> bool {
        let loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        loggers.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<Arc<Logger>> {
        let loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        loggers.get(name).cloned()
    }

    fn put(&self, name: &str, logger: Arc<Logger>) {
        let mut loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        loggers.insert(name.to_string(), logger);
    }
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loggers = self.loggers.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MemoryCache")
            .field("loggers", &loggers.keys().collect::<Vec<_>>())
            .finish()
    }
}

static GLOBAL_CACHE: Lazy<Arc<MemoryCache>> = Lazy::new(|| Arc::new(MemoryCache::new()));

/// The process-wide cache. Every facade handed this cache shares loggers by
/// channel name, regardless of which configuration built them.
pub fn global_cache() -> Arc<dyn LoggerCache> {
    GLOBAL_CACHE.clone()
}

pub struct Logwire {
    registry: Registry,
    cache: Arc<dyn LoggerCache>,
    // Held across lookup and insert so a channel is assembled once.
    assembling: Mutex<()>,
}

impl Logwire {
    /// Facade over the built-in types with a private cache.
    pub fn new(raw: RawConfig) -> Result<Self> {
        Ok(Self::from_registry(
            Registry::new(raw)?,
            Arc::new(MemoryCache::new()),
        ))
    }

    pub fn from_registry(registry: Registry, cache: Arc<dyn LoggerCache>) -> Self {
        Self {
            registry,
            cache,
            assembling: Mutex::new(()),
        }
    }

    /// The logger for a channel, assembled on first request.
    pub fn channel(&self, name: &str) -> Result<Arc<Logger>> {
        let _guard = self
            .assembling
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(logger) = self.cache.get(name) {
            tracing::trace!(channel = name, "logger cache hit");
            return Ok(logger);
        }

        let logger = Arc::new(Logger::from_channel(self.registry.channel(name)?));
        self.cache.put(name, logger.clone());
        Ok(logger)
    }

    /// The logger for the configured default channel.
    ///
    /// Fails with [`Error::NoDefaultConfigured`](crate::Error::NoDefaultConfigured)
    /// when no default is set and with
    /// [`Error::UnknownChannel`](crate::Error::UnknownChannel) when it names a
    /// channel that does not exist.
    pub fn default_logger(&self) -> Result<Arc<Logger>> {
        let name = self.registry.default_channel()?;
        self.channel(name)
    }

    /// The buffer a configured `memory` handler writes to, once that handler
    /// has been built.
    pub fn memory(&self, buffer: &str) -> Option<Memory> {
        self.registry.types().memory.get(buffer)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Logwire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logwire")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Kind};
    use serde_json::json;

    fn config() -> RawConfig {
        RawConfig::from_value(json!({
            "formatters": {"plain": {"formatter": "line", "format": "%channel%: %message%"}},
            "handlers": {"mem": {"handler": "memory", "formatter": "plain"}},
            "channels": {
                "app": {"handlers": ["mem"]},
                "audit": {"handlers": ["mem"]},
            },
            "default": "app",
        }))
        .unwrap()
    }

    #[test]
    fn test_channel_is_cached() {
        let logwire = Logwire::new(config()).unwrap();
        let first = logwire.channel("app").unwrap();
        let second = logwire.channel("app").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_channels_share_handlers() {
        let logwire = Logwire::new(config()).unwrap();
        let app = logwire.channel("app").unwrap();
        let audit = logwire.channel("audit").unwrap();
        assert!(std::ptr::addr_eq(
            Arc::as_ptr(&app.handlers()[0]),
            Arc::as_ptr(&audit.handlers()[0])
        ));
        assert!(logwire.registry().is_resolved(Kind::Formatter, "plain"));
    }

    #[test]
    fn test_memory_handler_lines_are_readable() {
        let logwire = Logwire::new(config()).unwrap();
        assert!(logwire.memory("memory").is_none());

        logwire.channel("app").unwrap().info("one").unwrap();
        logwire.channel("audit").unwrap().error("two").unwrap();

        let memory = logwire.memory("memory").expect("mem handler built");
        assert_eq!(memory.lines(), vec!["app: one", "audit: two"]);
    }

    #[test]
    fn test_default_logger() {
        let logwire = Logwire::new(config()).unwrap();
        let logger = logwire.default_logger().unwrap();
        assert_eq!(logger.name(), "app");
        assert!(Arc::ptr_eq(&logger, &logwire.channel("app").unwrap()));
    }

    #[test]
    fn test_default_logger_without_default() {
        let logwire = Logwire::new(RawConfig::new()).unwrap();
        let err = logwire.default_logger().unwrap_err();
        assert!(matches!(err, Error::NoDefaultConfigured));
    }

    #[test]
    fn test_missing_default_fails_only_on_use() {
        let raw = RawConfig::from_value(json!({
            "handlers": {"h": {"handler": "null"}},
            "channels": {"app": {"handlers": ["h"]}},
            "default": "gone",
        }))
        .unwrap();
        let logwire = Logwire::new(raw).unwrap();

        assert_eq!(logwire.registry().default_channel().unwrap(), "gone");
        assert!(logwire.channel("app").unwrap().info("still usable").unwrap());
        let err = logwire.default_logger().unwrap_err();
        assert!(matches!(err, Error::UnknownChannel(name) if name == "gone"));
    }

    #[test]
    fn test_concurrent_first_requests_share_one_logger() {
        let logwire = Logwire::new(config()).unwrap();
        let loggers: Vec<Arc<Logger>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| logwire.channel("audit").unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert!(loggers.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }

    #[test]
    fn test_unknown_channel_is_not_cached() {
        let cache = Arc::new(MemoryCache::new());
        let logwire = Logwire::from_registry(Registry::new(config()).unwrap(), cache.clone());
        assert!(matches!(
            logwire.channel("nope").unwrap_err(),
            Error::UnknownChannel(_)
        ));
        assert!(!cache.has("nope"));
    }

    #[test]
    fn test_shared_cache_across_facades() {
        let cache: Arc<dyn LoggerCache> = Arc::new(MemoryCache::new());
        let one = Logwire::from_registry(Registry::new(config()).unwrap(), cache.clone());
        let two = Logwire::from_registry(Registry::new(config()).unwrap(), cache.clone());

        let logger = one.channel("audit").unwrap();
        assert!(cache.has("audit"));
        assert!(Arc::ptr_eq(&logger, &two.channel("audit").unwrap()));
        assert!(!two.registry().is_resolved(Kind::Handler, "mem"));
    }

    #[test]
    fn test_global_cache_is_shared() {
        let logger = Arc::new(Logger::new("global-cache-test", Vec::new(), Vec::new()));
        global_cache().put("global-cache-test", logger.clone());
        let found = global_cache().get("global-cache-test").unwrap();
        assert!(Arc::ptr_eq(&logger, &found));
    }
}
