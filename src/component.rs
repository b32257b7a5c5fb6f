//! Capabilities the resolved components expose to channels.

use std::sync::Arc;

use crate::{Record, Result};

/// Renders a record into its final textual representation.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record) -> Result<String>;
}

/// Enriches or transforms a record before it is formatted.
///
/// Any `Fn(Record) -> Record` closure is a processor.
pub trait Processor: Send + Sync {
    fn process(&self, record: Record) -> Record;
}

impl<F> Processor for F
where
    F: Fn(Record) -> Record + Send + Sync,
{
    fn process(&self, record: Record) -> Record {
        self(record)
    }
}

/// Dispatches records to a destination.
///
/// `set_formatter` and `push_processor` are called while the handler is still
/// exclusively owned, before it is shared by any channel.
pub trait Handler: Send + Sync {
    /// Whether the handler accepts a record of this level.
    fn is_handling(&self, record: &Record) -> bool;

    /// Process, format and write the record.
    fn handle(&self, record: &Record) -> Result<()>;

    fn set_formatter(&mut self, formatter: Arc<dyn Formatter>);

    fn formatter(&self) -> Option<&Arc<dyn Formatter>>;

    /// Append a processor; processors run in the order they were pushed.
    fn push_processor(&mut self, processor: Arc<dyn Processor>);
}
