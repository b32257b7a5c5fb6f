use std::collections::{BTreeMap, VecDeque};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::binder::BoundArgs;
use crate::builtin::formatter::LineFormatter;
use crate::{Formatter, Handler, Level, Processor, Record, Result};

/// Destination of a [`SinkHandler`].
pub trait Sink: Send + Sync {
    /// Write one record. `record` has already been through the handler's
    /// processors and `formatted` is its rendering.
    fn write(&self, record: &Record, formatted: &str) -> Result<()>;
}

/// A handler made of a level threshold, an optional formatter, a processor
/// list and a sink.
pub struct SinkHandler<S> {
    level: Level,
    formatter: Option<Arc<dyn Formatter>>,
    processors: Vec<Arc<dyn Processor>>,
    sink: S,
}

impl<S: Sink> SinkHandler<S> {
    pub fn new(level: Level, sink: S) -> Self {
        Self {
            level,
            formatter: None,
            processors: Vec::new(),
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: Sink> Handler for SinkHandler<S> {
    fn is_handling(&self, record: &Record) -> bool {
        record.level >= self.level
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let record = self
            .processors
            .iter()
            .fold(record.clone(), |record, processor| processor.process(record));

        let formatted = match &self.formatter {
            Some(formatter) => formatter.format(&record)?,
            None => LineFormatter::default().format(&record)?,
        };

        self.sink.write(&record, &formatted)
    }

    fn set_formatter(&mut self, formatter: Arc<dyn Formatter>) {
        self.formatter = Some(formatter);
    }

    fn formatter(&self) -> Option<&Arc<dyn Formatter>> {
        self.formatter.as_ref()
    }

    fn push_processor(&mut self, processor: Arc<dyn Processor>) {
        self.processors.push(processor);
    }
}

/// Writes to stdout, stderr or a file opened in append mode.
pub struct Stream {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Stream {
    /// `stdout` and `stderr` name the standard streams; anything else is a
    /// file path whose parent directories are created as needed.
    pub fn open(target: &str) -> io::Result<Self> {
        let writer: Box<dyn Write + Send> = match target {
            "stdout" => Box::new(io::stdout()),
            "stderr" => Box::new(io::stderr()),
            path => {
                let path = Path::new(path);
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent)?;
                }
                Box::new(OpenOptions::new().create(true).append(true).open(path)?)
            }
        };

        Ok(Self {
            writer: Mutex::new(writer),
        })
    }
}

impl Sink for Stream {
    fn write(&self, _record: &Record, formatted: &str) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(formatted.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Swallows every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl Sink for Discard {
    fn write(&self, _record: &Record, _formatted: &str) -> Result<()> {
        Ok(())
    }
}

/// Keeps formatted records in memory. Clones share the same buffer.
///
/// A bounded buffer drops its oldest line once it holds `max_lines`.
#[derive(Debug, Default, Clone)]
pub struct Memory {
    lines: Arc<Mutex<VecDeque<String>>>,
    max_lines: usize,
}

impl Memory {
    /// An unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer keeping the last `max_lines` lines; zero means unbounded.
    pub fn bounded(max_lines: usize) -> Self {
        Self {
            lines: Arc::default(),
            max_lines,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Sink for Memory {
    fn write(&self, _record: &Record, formatted: &str) -> Result<()> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.push_back(formatted.to_string());
        if self.max_lines > 0 && lines.len() > self.max_lines {
            lines.pop_front();
        }
        Ok(())
    }
}

/// Named [`Memory`] buffers written by configured `memory` handlers.
///
/// Handlers naming the same buffer share it; the first one to be built sets
/// its capacity. Clones share the same set of buffers.
#[derive(Debug, Default, Clone)]
pub struct MemoryBuffers {
    buffers: Arc<Mutex<BTreeMap<String, Memory>>>,
}

impl MemoryBuffers {
    /// The buffer called `name`, once a handler writing to it has been built.
    pub fn get(&self, name: &str) -> Option<Memory> {
        let buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        buffers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        buffers.keys().cloned().collect()
    }

    fn open(&self, name: &str, max_lines: usize) -> Memory {
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        buffers
            .entry(name.to_string())
            .or_insert_with(|| Memory::bounded(max_lines))
            .clone()
    }
}

/// Re-emits records as `tracing` events under the `logwire::channel` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn write(&self, record: &Record, _formatted: &str) -> Result<()> {
        let channel = record.channel.as_str();
        let message = record.message.as_str();
        match record.level {
            Level::Debug => tracing::debug!(target: "logwire::channel", channel, "{}", message),
            Level::Info | Level::Notice => {
                tracing::info!(target: "logwire::channel", channel, "{}", message)
            }
            Level::Warning => tracing::warn!(target: "logwire::channel", channel, "{}", message),
            Level::Error | Level::Critical | Level::Alert | Level::Emergency => {
                tracing::error!(target: "logwire::channel", channel, "{}", message)
            }
        }
        Ok(())
    }
}

/// Date-rotated log files, built on `tracing-appender`.
#[cfg(feature = "file")]
pub struct RollingFile {
    appender: Mutex<tracing_appender::rolling::RollingFileAppender>,
}

#[cfg(feature = "file")]
impl RollingFile {
    /// `rotation` is one of `minutely`, `hourly`, `daily` or `never`; a
    /// `max_files` of zero keeps every file.
    pub fn open(filename: &Path, rotation: &str, max_files: usize) -> Result<Self> {
        use tracing_appender::rolling::{RollingFileAppender, Rotation};

        let rotation = match rotation {
            "minutely" => Rotation::MINUTELY,
            "hourly" => Rotation::HOURLY,
            "daily" => Rotation::DAILY,
            "never" => Rotation::NEVER,
            other => {
                return Err(crate::Error::Config(format!(
                    "unknown rotation `{}`, supported: minutely/hourly/daily/never",
                    other
                )));
            }
        };

        let prefix = filename
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                crate::Error::Config(format!("`{}` has no file name", filename.display()))
            })?;
        let dir = filename
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut builder = RollingFileAppender::builder()
            .rotation(rotation)
            .filename_prefix(prefix);
        if max_files > 0 {
            builder = builder.max_log_files(max_files);
        }
        let appender = builder
            .build(dir)
            .map_err(|e| crate::Error::Init(e.to_string()))?;

        Ok(Self {
            appender: Mutex::new(appender),
        })
    }
}

#[cfg(feature = "file")]
impl Sink for RollingFile {
    fn write(&self, _record: &Record, formatted: &str) -> Result<()> {
        let mut appender = self.appender.lock().unwrap_or_else(PoisonError::into_inner);
        appender.write_all(formatted.as_bytes())?;
        appender.flush()?;
        Ok(())
    }
}

pub(crate) fn stream(args: &mut BoundArgs) -> Result<Box<dyn Handler>> {
    let sink = Stream::open(args.str("stream")?)?;
    Ok(Box::new(SinkHandler::new(args.level("level")?, sink)))
}

pub(crate) fn discard(args: &mut BoundArgs) -> Result<Box<dyn Handler>> {
    Ok(Box::new(SinkHandler::new(args.level("level")?, Discard)))
}

pub(crate) fn memory(args: &mut BoundArgs, buffers: &MemoryBuffers) -> Result<Box<dyn Handler>> {
    let max_lines = usize::try_from(args.u64("max_lines")?)
        .map_err(|_| args.invalid("max_lines", "too large"))?;
    let sink = buffers.open(args.str("buffer")?, max_lines);
    Ok(Box::new(SinkHandler::new(args.level("level")?, sink)))
}

pub(crate) fn tracing_events(args: &mut BoundArgs) -> Result<Box<dyn Handler>> {
    Ok(Box::new(SinkHandler::new(args.level("level")?, TracingSink)))
}

#[cfg(feature = "file")]
pub(crate) fn rolling_file(args: &mut BoundArgs) -> Result<Box<dyn Handler>> {
    let max_files = usize::try_from(args.u64("max_files")?)
        .map_err(|_| args.invalid("max_files", "too large"))?;
    let sink = RollingFile::open(
        Path::new(args.str("filename")?),
        args.str("rotation")?,
        max_files,
    )?;
    Ok(Box::new(SinkHandler::new(args.level("level")?, sink)))
}
