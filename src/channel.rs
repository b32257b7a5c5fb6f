//! Channel assembly: a channel name turned into its resolved handlers and
//! processors.

use std::fmt;
use std::sync::Arc;

use crate::{Arguments, Error, Handler, Processor, Registry, Result};

/// A channel with its handlers and processors resolved, in configured order.
#[derive(Clone)]
pub struct ChannelDescriptor {
    pub name: String,
    pub handlers: Vec<Arc<dyn Handler>>,
    pub processors: Vec<Arc<dyn Processor>>,
    /// Keys of the channel entry other than `handlers` and `processors`.
    pub extra: Arguments,
}

impl fmt::Debug for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelDescriptor")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .field("processors", &self.processors.len())
            .field("extra", &self.extra)
            .finish()
    }
}

impl Registry {
    /// Assemble a channel.
    ///
    /// Nothing is cached at this level, but the components themselves are
    /// memoized, so repeated calls return the same handler and processor
    /// instances.
    pub fn channel(&self, name: &str) -> Result<ChannelDescriptor> {
        let spec = self
            .channel_spec(name)
            .filter(|_| !name.is_empty())
            .ok_or_else(|| Error::UnknownChannel(name.to_string()))?;

        let handlers = spec
            .handlers
            .iter()
            .map(|id| self.handler(id))
            .collect::<Result<Vec<_>>>()?;
        let processors = spec
            .processors
            .iter()
            .map(|id| self.processor(id))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            channel = name,
            handlers = handlers.len(),
            processors = processors.len(),
            "assembled channel"
        );

        Ok(ChannelDescriptor {
            name: name.to_string(),
            handlers,
            processors,
            extra: spec.extra.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Param;
    use crate::builtin::{Discard, LineFormatter, SinkHandler};
    use crate::{Formatter, Kind, Level, RawConfig, Types};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
    }

    /// Types named like the classes of a typical configuration, counting
    /// constructions.
    fn counting_types(formatters: Arc<AtomicUsize>, handlers: Arc<AtomicUsize>) -> Types {
        let mut types = Types::default();
        types.formatters.register("LineFmt", &[], move |_| {
            formatters.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(LineFormatter::default()) as Box<dyn Formatter>)
        });
        types
            .handlers
            .register("StreamH", &[Param::required("path")], move |args| {
                args.str("path")?;
                handlers.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(SinkHandler::new(Level::Debug, Discard)) as Box<dyn Handler>)
            });
        types
    }

    #[test]
    fn test_channel_assembly_scenario() {
        let formatters = Arc::new(AtomicUsize::new(0));
        let handlers = Arc::new(AtomicUsize::new(0));
        let raw = RawConfig::from_value(json!({
            "formatters": {"f1": {"formatter": "LineFmt"}},
            "handlers": {"h1": {"handler": "StreamH", "formatter": "f1", "path": "/tmp/x"}},
            "channels": {"c1": {"handlers": ["h1"]}},
            "default": "c1",
        }))
        .unwrap();
        let registry = Registry::with_types(
            raw,
            counting_types(formatters.clone(), handlers.clone()),
            BTreeMap::new(),
        )
        .unwrap();

        let first = registry.channel("c1").unwrap();
        assert_eq!(first.name, "c1");
        assert_eq!(first.handlers.len(), 1);
        assert!(first.processors.is_empty());
        assert!(same(
            first.handlers[0].formatter().unwrap(),
            &registry.formatter("f1").unwrap()
        ));

        let second = registry.channel("c1").unwrap();
        assert!(same(&first.handlers[0], &second.handlers[0]));
        assert_eq!(formatters.load(Ordering::SeqCst), 1);
        assert_eq!(handlers.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_channel() {
        let registry = Registry::new(RawConfig::new()).unwrap();
        let err = registry.channel("missing").unwrap_err();
        assert!(matches!(err, Error::UnknownChannel(name) if name == "missing"));

        let err = registry.channel("").unwrap_err();
        assert!(matches!(err, Error::UnknownChannel(_)));
    }

    #[test]
    fn test_channel_order_and_extra() {
        let registry = Registry::new(
            RawConfig::from_value(json!({
                "processors": {
                    "p1": {"processor": "tags"},
                    "p2": {"processor": "psr_message"},
                },
                "handlers": {
                    "h1": {"handler": "null"},
                    "h2": {"handler": "memory"},
                },
                "channels": {"app": {
                    "handlers": ["h2", "h1"],
                    "processors": ["p2", "p1"],
                    "description": "main",
                }},
            }))
            .unwrap(),
        )
        .unwrap();

        assert!(!registry.is_resolved(Kind::Handler, "h1"));
        let channel = registry.channel("app").unwrap();

        assert!(same(&channel.handlers[0], &registry.handler("h2").unwrap()));
        assert!(same(&channel.handlers[1], &registry.handler("h1").unwrap()));
        assert!(same(&channel.processors[0], &registry.processor("p2").unwrap()));
        assert!(same(&channel.processors[1], &registry.processor("p1").unwrap()));
        assert_eq!(channel.extra["description"], "main");
    }

    #[test]
    fn test_channel_surfaces_binding_errors() {
        let registry = Registry::new(
            RawConfig::from_value(json!({
                "handlers": {"h1": {}},
                "channels": {"app": {"handlers": ["h1"]}},
            }))
            .unwrap(),
        )
        .unwrap();

        let err = registry.channel("app").unwrap_err();
        assert!(matches!(err, Error::MissingArgument { parameter, .. } if parameter == "stream"));
    }
}
