//! Raw channel configuration and its validation into component specs.
//!
//! Sections are parsed in the order formatters, processors, handlers,
//! channels, so that every reference is checked against a namespace that is
//! already complete. Nothing is constructed here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::binder::TypeRegistry;
use crate::{Arguments, Error, Processor, Result, Types};

/// Type used for a formatter entry that does not name one.
pub const DEFAULT_FORMATTER: &str = "line";
/// Type used for a handler entry that does not name one.
pub const DEFAULT_HANDLER: &str = "stream";

/// Configuration for a set of logging channels, as written by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawConfig {
    /// Formatter options by id; `formatter` names the type
    #[serde(default)]
    pub formatters: BTreeMap<String, Arguments>,
    /// Handler options by id; `handler` names the type
    #[serde(default)]
    pub handlers: BTreeMap<String, Arguments>,
    /// Processor options by id; `processor` names the type
    #[serde(default)]
    pub processors: BTreeMap<String, Arguments>,
    /// Channel options by name
    #[serde(default)]
    pub channels: BTreeMap<String, Arguments>,
    /// Name of the default channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl RawConfig {
    /// Create an empty RawConfig
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Add a formatter entry
    pub fn with_formatter(mut self, id: impl Into<String>, options: Arguments) -> Self {
        self.formatters.insert(id.into(), options);
        self
    }

    /// Add a handler entry
    pub fn with_handler(mut self, id: impl Into<String>, options: Arguments) -> Self {
        self.handlers.insert(id.into(), options);
        self
    }

    /// Add a processor entry
    pub fn with_processor(mut self, id: impl Into<String>, options: Arguments) -> Self {
        self.processors.insert(id.into(), options);
        self
    }

    /// Add a channel entry
    pub fn with_channel(mut self, name: impl Into<String>, options: Arguments) -> Self {
        self.channels.insert(name.into(), options);
        self
    }

    /// Set the default channel
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }
}

/// An unconstructed component: a type name and its constructor arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    pub type_name: String,
    pub args: Arguments,
}

/// A handler spec with its references lifted out of the arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSpec {
    pub component: ComponentSpec,
    pub formatter: Option<String>,
    pub processors: Vec<String>,
}

/// A processor is either built from a spec or supplied ready to use.
#[derive(Clone)]
pub enum ProcessorEntry {
    Spec(ComponentSpec),
    Instance(Arc<dyn Processor>),
}

impl fmt::Debug for ProcessorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorEntry::Spec(spec) => f.debug_tuple("Spec").field(spec).finish(),
            ProcessorEntry::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// A channel: handler and processor ids in invocation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSpec {
    pub handlers: Vec<String>,
    pub processors: Vec<String>,
    /// Any other keys of the channel entry.
    pub extra: Arguments,
}

/// A validated configuration.
#[derive(Debug, Default)]
pub struct ParsedConfig {
    pub formatters: BTreeMap<String, ComponentSpec>,
    pub processors: BTreeMap<String, ProcessorEntry>,
    pub handlers: BTreeMap<String, HandlerSpec>,
    pub channels: BTreeMap<String, ChannelSpec>,
    pub default: Option<String>,
}

/// Validate a raw configuration against the known types.
///
/// `instances` are ready-made processors; a processor entry without a
/// `processor` type must have an instance under the same id.
pub fn parse(
    raw: RawConfig,
    types: &Types,
    instances: BTreeMap<String, Arc<dyn Processor>>,
) -> Result<ParsedConfig> {
    let formatters = parse_formatters(raw.formatters, types)?;
    let processors = parse_processors(raw.processors, types, instances)?;
    let handlers = parse_handlers(raw.handlers, types, &formatters, &processors)?;
    let channels = parse_channels(raw.channels, &handlers, &processors)?;

    // Checked when the default channel is requested, not here.
    let default = raw.default.filter(|name| !name.is_empty());

    tracing::debug!(
        formatters = formatters.len(),
        processors = processors.len(),
        handlers = handlers.len(),
        channels = channels.len(),
        "parsed logging configuration"
    );

    Ok(ParsedConfig {
        formatters,
        processors,
        handlers,
        channels,
        default,
    })
}

fn parse_formatters(
    entries: BTreeMap<String, Arguments>,
    types: &Types,
) -> Result<BTreeMap<String, ComponentSpec>> {
    entries
        .into_iter()
        .map(|(id, mut options)| {
            let type_name = take_type(&mut options, "formatter", &id)?
                .unwrap_or_else(|| DEFAULT_FORMATTER.to_string());
            ensure_type(&types.formatters, &type_name)?;
            Ok((
                id,
                ComponentSpec {
                    type_name,
                    args: options,
                },
            ))
        })
        .collect()
}

fn parse_processors(
    entries: BTreeMap<String, Arguments>,
    types: &Types,
    mut instances: BTreeMap<String, Arc<dyn Processor>>,
) -> Result<BTreeMap<String, ProcessorEntry>> {
    let mut processors = BTreeMap::new();

    for (id, mut options) in entries {
        let entry = match take_type(&mut options, "processor", &id)? {
            Some(type_name) => {
                ensure_type(&types.processors, &type_name)?;
                instances.remove(&id);
                ProcessorEntry::Spec(ComponentSpec {
                    type_name,
                    args: options,
                })
            }
            None => match instances.remove(&id) {
                Some(instance) => ProcessorEntry::Instance(instance),
                None => {
                    return Err(Error::Config(format!(
                        "processor `{}` names no type and no instance was supplied for it",
                        id
                    )));
                }
            },
        };
        processors.insert(id, entry);
    }

    for (id, instance) in instances {
        processors.insert(id, ProcessorEntry::Instance(instance));
    }

    Ok(processors)
}

fn parse_handlers(
    entries: BTreeMap<String, Arguments>,
    types: &Types,
    formatters: &BTreeMap<String, ComponentSpec>,
    processors: &BTreeMap<String, ProcessorEntry>,
) -> Result<BTreeMap<String, HandlerSpec>> {
    let mut handlers = BTreeMap::new();

    for (id, mut options) in entries {
        let formatter = take_id(&mut options, "formatter", &id)?;
        if let Some(formatter_id) = &formatter
            && !formatters.contains_key(formatter_id)
        {
            return Err(Error::UnconfiguredFormatter(formatter_id.clone()));
        }

        let processor_ids = take_ids(&mut options, "processors", &id)?;
        check_refs(&processor_ids, processors, Error::UnconfiguredProcessor)?;

        let type_name = take_type(&mut options, "handler", &id)?
            .unwrap_or_else(|| DEFAULT_HANDLER.to_string());
        ensure_type(&types.handlers, &type_name)?;

        handlers.insert(
            id,
            HandlerSpec {
                component: ComponentSpec {
                    type_name,
                    args: options,
                },
                formatter,
                processors: processor_ids,
            },
        );
    }

    Ok(handlers)
}

fn parse_channels(
    entries: BTreeMap<String, Arguments>,
    handlers: &BTreeMap<String, HandlerSpec>,
    processors: &BTreeMap<String, ProcessorEntry>,
) -> Result<BTreeMap<String, ChannelSpec>> {
    let mut channels = BTreeMap::new();

    for (name, mut options) in entries {
        let processor_ids = take_ids(&mut options, "processors", &name)?;
        check_refs(&processor_ids, processors, Error::UnconfiguredProcessor)?;

        let handler_ids = take_ids(&mut options, "handlers", &name)?;
        check_refs(&handler_ids, handlers, Error::UnconfiguredHandler)?;

        channels.insert(
            name,
            ChannelSpec {
                handlers: handler_ids,
                processors: processor_ids,
                extra: options,
            },
        );
    }

    Ok(channels)
}

fn check_refs<V>(
    ids: &[String],
    namespace: &BTreeMap<String, V>,
    unconfigured: fn(String) -> Error,
) -> Result<()> {
    match ids.iter().find(|id| !namespace.contains_key(*id)) {
        Some(missing) => Err(unconfigured(missing.clone())),
        None => Ok(()),
    }
}

fn ensure_type<T>(registry: &TypeRegistry<T>, type_name: &str) -> Result<()> {
    if registry.contains(type_name) {
        Ok(())
    } else {
        Err(Error::UnknownType {
            kind: registry.kind(),
            name: type_name.to_string(),
        })
    }
}

/// Remove a type-name key. Null and empty strings count as unset.
fn take_type(options: &mut Arguments, key: &str, owner: &str) -> Result<Option<String>> {
    Ok(take_id(options, key, owner)?.filter(|name| !name.is_empty()))
}

fn take_id(options: &mut Arguments, key: &str, owner: &str) -> Result<Option<String>> {
    match options.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::Config(format!(
            "`{}` of `{}` must be a string",
            key, owner
        ))),
    }
}

fn take_ids(options: &mut Arguments, key: &str, owner: &str) -> Result<Vec<String>> {
    let invalid = || Error::Config(format!("`{}` of `{}` must be a list of ids", key, owner));

    match options.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s]),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(invalid()),
            })
            .collect(),
        Some(_) => Err(invalid()),
    }
}
