//! Memoized, on-demand construction of configured components.
//!
//! Each namespace maps an id to a slot. A slot starts out holding a spec
//! and is replaced by the live instance the first time the id is looked up,
//! whether directly or while resolving something that references it. The
//! reference graph only points from channels to handlers and processors and
//! from handlers to formatters and processors, so resolution always
//! terminates.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::binder::Injected;
use crate::config::{self, ChannelSpec, ComponentSpec, HandlerSpec, ParsedConfig, ProcessorEntry};
use crate::types::Kind;
use crate::{Error, Formatter, Handler, Processor, RawConfig, Result, Types};

enum Slot<S, T> {
    Unresolved(S),
    Resolved(T),
}

/// One id → slot map. The lock is held while a slot is being built, so an id
/// is never constructed twice even with concurrent callers.
struct Namespace<S, T> {
    kind: Kind,
    slots: Mutex<BTreeMap<String, Slot<S, T>>>,
}

impl<S, T: Clone> Namespace<S, T> {
    fn new(kind: Kind, slots: BTreeMap<String, Slot<S, T>>) -> Self {
        Self {
            kind,
            slots: Mutex::new(slots),
        }
    }

    fn resolve(&self, id: &str, build: impl FnOnce(&S) -> Result<T>) -> Result<T> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.get_mut(id).ok_or_else(|| Error::UnknownIdentifier {
            namespace: self.kind,
            id: id.to_string(),
        })?;

        let instance = match &*slot {
            Slot::Resolved(instance) => return Ok(instance.clone()),
            Slot::Unresolved(spec) => build(spec)?,
        };

        tracing::debug!(namespace = %self.kind, id, "resolved component");
        *slot = Slot::Resolved(instance.clone());
        Ok(instance)
    }

    fn is_resolved(&self, id: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(slots.get(id), Some(Slot::Resolved(_)))
    }

    fn ids(&self) -> Vec<String> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.keys().cloned().collect()
    }
}

/// The parsed entries, kept as written after their slots are resolved.
#[derive(Debug)]
struct Specs {
    formatters: BTreeMap<String, ComponentSpec>,
    handlers: BTreeMap<String, HandlerSpec>,
    processors: BTreeMap<String, ComponentSpec>,
}

/// Parsed configuration plus the instances built from it so far.
pub struct Registry {
    types: Types,
    specs: Specs,
    formatters: Namespace<ComponentSpec, Arc<dyn Formatter>>,
    handlers: Namespace<HandlerSpec, Arc<dyn Handler>>,
    processors: Namespace<ComponentSpec, Arc<dyn Processor>>,
    channels: BTreeMap<String, ChannelSpec>,
    default: Option<String>,
}

impl Registry {
    /// Parse `raw` against the built-in types.
    pub fn new(raw: RawConfig) -> Result<Self> {
        Self::with_types(raw, Types::default(), BTreeMap::new())
    }

    /// Parse `raw` against custom types, with ready-made processors.
    pub fn with_types(
        raw: RawConfig,
        types: Types,
        instances: BTreeMap<String, Arc<dyn Processor>>,
    ) -> Result<Self> {
        let parsed = config::parse(raw, &types, instances)?;
        Ok(Self::from_parsed(parsed, types))
    }

    fn from_parsed(parsed: ParsedConfig, types: Types) -> Self {
        let specs = Specs {
            formatters: parsed.formatters.clone(),
            handlers: parsed.handlers.clone(),
            processors: parsed
                .processors
                .iter()
                .filter_map(|(id, entry)| match entry {
                    ProcessorEntry::Spec(spec) => Some((id.clone(), spec.clone())),
                    ProcessorEntry::Instance(_) => None,
                })
                .collect(),
        };
        let formatters = parsed
            .formatters
            .into_iter()
            .map(|(id, spec)| (id, Slot::Unresolved(spec)))
            .collect();
        let handlers = parsed
            .handlers
            .into_iter()
            .map(|(id, spec)| (id, Slot::Unresolved(spec)))
            .collect();
        let processors = parsed
            .processors
            .into_iter()
            .map(|(id, entry)| match entry {
                ProcessorEntry::Spec(spec) => (id, Slot::Unresolved(spec)),
                ProcessorEntry::Instance(instance) => (id, Slot::Resolved(instance)),
            })
            .collect();

        Self {
            types,
            specs,
            formatters: Namespace::new(Kind::Formatter, formatters),
            handlers: Namespace::new(Kind::Handler, handlers),
            processors: Namespace::new(Kind::Processor, processors),
            channels: parsed.channels,
            default: parsed.default,
        }
    }

    /// The formatter with this id, built on first use.
    pub fn formatter(&self, id: &str) -> Result<Arc<dyn Formatter>> {
        self.formatters.resolve(id, |spec| {
            let formatter = self.types.formatters.bind(&spec.type_name, &spec.args)?;
            Ok(Arc::from(formatter))
        })
    }

    /// The handler with this id, built on first use.
    ///
    /// Its formatter and processors are resolved first and offered to the
    /// handler's factory; whatever the factory does not take is attached to
    /// the new handler through `set_formatter` and `push_processor`.
    pub fn handler(&self, id: &str) -> Result<Arc<dyn Handler>> {
        self.handlers.resolve(id, |spec| {
            let formatter = spec
                .formatter
                .as_deref()
                .map(|formatter_id| self.formatter(formatter_id))
                .transpose()?;
            let processors = spec
                .processors
                .iter()
                .map(|processor_id| self.processor(processor_id))
                .collect::<Result<Vec<_>>>()?;

            let (mut handler, rest) = self.types.handlers.bind_with(
                &spec.component.type_name,
                &spec.component.args,
                Injected {
                    formatter,
                    processors,
                },
            )?;

            if let Some(formatter) = rest.formatter {
                handler.set_formatter(formatter);
            }
            for processor in rest.processors {
                handler.push_processor(processor);
            }

            Ok(Arc::from(handler))
        })
    }

    /// The processor with this id. Ready-made processors are returned as is.
    pub fn processor(&self, id: &str) -> Result<Arc<dyn Processor>> {
        self.processors.resolve(id, |spec| {
            let processor = self.types.processors.bind(&spec.type_name, &spec.args)?;
            Ok(Arc::from(processor))
        })
    }

    /// The parsed spec of a formatter, resolved or not.
    pub fn formatter_spec(&self, id: &str) -> Option<&ComponentSpec> {
        self.specs.formatters.get(id)
    }

    pub fn handler_spec(&self, id: &str) -> Option<&HandlerSpec> {
        self.specs.handlers.get(id)
    }

    /// `None` for unknown ids and for ready-made processors.
    pub fn processor_spec(&self, id: &str) -> Option<&ComponentSpec> {
        self.specs.processors.get(id)
    }

    /// The parsed spec of a channel.
    pub fn channel_spec(&self, name: &str) -> Option<&ChannelSpec> {
        self.channels.get(name)
    }

    /// Name of the configured default channel.
    pub fn default_channel(&self) -> Result<&str> {
        self.default.as_deref().ok_or(Error::NoDefaultConfigured)
    }

    /// Whether an id has already been turned into an instance.
    pub fn is_resolved(&self, kind: Kind, id: &str) -> bool {
        match kind {
            Kind::Formatter => self.formatters.is_resolved(id),
            Kind::Handler => self.handlers.is_resolved(id),
            Kind::Processor => self.processors.is_resolved(id),
            Kind::Channel => false,
        }
    }

    /// All ids configured in a namespace, sorted.
    pub fn ids(&self, kind: Kind) -> Vec<String> {
        match kind {
            Kind::Formatter => self.formatters.ids(),
            Kind::Handler => self.handlers.ids(),
            Kind::Processor => self.processors.ids(),
            Kind::Channel => self.channels.keys().cloned().collect(),
        }
    }

    pub fn types(&self) -> &Types {
        &self.types
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("formatters", &self.formatters.ids())
            .field("handlers", &self.handlers.ids())
            .field("processors", &self.processors.ids())
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .field("default", &self.default)
            .finish()
    }
}
