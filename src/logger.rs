use std::fmt;
use std::sync::Arc;

use crate::{Arguments, ChannelDescriptor, Handler, Level, Processor, Record, Result};

/// An assembled channel ready to log.
///
/// A record goes through the channel processors in order, then is offered to
/// every handler, in order, that accepts its level.
pub struct Logger {
    name: String,
    handlers: Vec<Arc<dyn Handler>>,
    processors: Vec<Arc<dyn Processor>>,
}

impl Logger {
    pub fn new(
        name: impl Into<String>,
        handlers: Vec<Arc<dyn Handler>>,
        processors: Vec<Arc<dyn Processor>>,
    ) -> Self {
        Self {
            name: name.into(),
            handlers,
            processors,
        }
    }

    pub fn from_channel(channel: ChannelDescriptor) -> Self {
        Self::new(channel.name, channel.handlers, channel.processors)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    pub fn processors(&self) -> &[Arc<dyn Processor>] {
        &self.processors
    }

    /// Log a message with context. Returns whether any handler took it.
    pub fn log(&self, level: Level, message: impl Into<String>, context: Arguments) -> Result<bool> {
        let record = Record::new(self.name.as_str(), level, message).with_context(context);

        if !self.handlers.iter().any(|handler| handler.is_handling(&record)) {
            return Ok(false);
        }

        let record = self
            .processors
            .iter()
            .fold(record, |record, processor| processor.process(record));

        for handler in &self.handlers {
            if handler.is_handling(&record) {
                handler.handle(&record)?;
            }
        }

        Ok(true)
    }

    pub fn debug(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Debug, message, Arguments::new())
    }

    pub fn info(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Info, message, Arguments::new())
    }

    pub fn notice(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Notice, message, Arguments::new())
    }

    pub fn warning(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Warning, message, Arguments::new())
    }

    pub fn error(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Error, message, Arguments::new())
    }

    pub fn critical(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Critical, message, Arguments::new())
    }

    pub fn alert(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Alert, message, Arguments::new())
    }

    pub fn emergency(&self, message: impl Into<String>) -> Result<bool> {
        self.log(Level::Emergency, message, Arguments::new())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .field("processors", &self.processors.len())
            .finish()
    }
}
