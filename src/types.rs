use serde::{Deserialize, Serialize};
use std::fmt;

use crate::binder::TypeRegistry;
use crate::builtin::MemoryBuffers;
use crate::{Formatter, Handler, Processor};

/// The namespaces a component id can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Formatter,
    Handler,
    Processor,
    Channel,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Formatter => "formatter",
            Kind::Handler => "handler",
            Kind::Processor => "processor",
            Kind::Channel => "channel",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The constructible component types, one registry per kind.
#[derive(Debug)]
pub struct Types {
    pub formatters: TypeRegistry<Box<dyn Formatter>>,
    pub handlers: TypeRegistry<Box<dyn Handler>>,
    pub processors: TypeRegistry<Box<dyn Processor>>,
    /// Buffers written by built-in `memory` handlers.
    pub memory: MemoryBuffers,
}

impl Types {
    /// Registries with no types at all.
    pub fn empty() -> Self {
        Self {
            formatters: TypeRegistry::new(Kind::Formatter),
            handlers: TypeRegistry::new(Kind::Handler),
            processors: TypeRegistry::new(Kind::Processor),
            memory: MemoryBuffers::default(),
        }
    }

    /// Registries pre-populated with the built-in components.
    pub fn with_builtins() -> Self {
        let mut types = Self::empty();
        crate::builtin::register(&mut types);
        types
    }
}

impl Default for Types {
    fn default() -> Self {
        Self::with_builtins()
    }
}
