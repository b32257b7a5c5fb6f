//! Components every configuration can name without registering anything.
//!
//! | kind      | type            | parameters                                                      |
//! |-----------|-----------------|-----------------------------------------------------------------|
//! | formatter | `line`          | `format`, `date_format`, `allow_inline_line_breaks`, `ignore_empty_context_and_extra` |
//! | formatter | `json`          | `append_newline`                                                |
//! | handler   | `stream`        | `stream` (required), `level`                                    |
//! | handler   | `null`          | `level`                                                         |
//! | handler   | `memory`        | `buffer`, `max_lines`, `level` (read back through [`MemoryBuffers`]) |
//! | handler   | `tracing`       | `level`                                                         |
//! | handler   | `rotating_file` | `filename` (required), `rotation`, `max_files`, `level` (feature `file`) |
//! | processor | `psr_message`   | `remove_used_context_fields`                                    |
//! | processor | `tags`          | `tags`                                                          |

pub mod formatter;
pub mod handler;
pub mod processor;

use crate::binder::{BoundArgs, Param};
use crate::{Formatter, Result, Types};

pub use formatter::{JsonFormatter, LineFormatter, SIMPLE_DATE, SIMPLE_FORMAT};
#[cfg(feature = "file")]
pub use handler::RollingFile;
pub use handler::{Discard, Memory, MemoryBuffers, Sink, SinkHandler, Stream, TracingSink};
pub use processor::{PsrMessage, Tags};

fn line(args: &mut BoundArgs) -> Result<Box<dyn Formatter>> {
    Ok(Box::new(LineFormatter::from_args(args)?))
}

fn json(args: &mut BoundArgs) -> Result<Box<dyn Formatter>> {
    Ok(Box::new(JsonFormatter::from_args(args)?))
}

pub(crate) fn register(types: &mut Types) {
    types.formatters.register(
        "line",
        &[
            Param::optional("format", SIMPLE_FORMAT),
            Param::optional("date_format", SIMPLE_DATE),
            Param::optional("allow_inline_line_breaks", false),
            Param::optional("ignore_empty_context_and_extra", false),
        ],
        line,
    );
    types
        .formatters
        .register("json", &[Param::optional("append_newline", true)], json);

    let level = || Param::optional("level", "debug");
    types.handlers.register(
        "stream",
        &[Param::required("stream"), level()],
        handler::stream,
    );
    types.handlers.register("null", &[level()], handler::discard);
    let buffers = types.memory.clone();
    types.handlers.register(
        "memory",
        &[
            Param::optional("buffer", "memory"),
            Param::optional("max_lines", 1000),
            level(),
        ],
        move |args| handler::memory(args, &buffers),
    );
    types
        .handlers
        .register("tracing", &[level()], handler::tracing_events);
    #[cfg(feature = "file")]
    types.handlers.register(
        "rotating_file",
        &[
            Param::required("filename"),
            Param::optional("rotation", "daily"),
            Param::optional("max_files", 0),
            level(),
        ],
        handler::rolling_file,
    );

    types.processors.register(
        "psr_message",
        &[Param::optional("remove_used_context_fields", false)],
        processor::psr_message,
    );
    types.processors.register(
        "tags",
        &[Param::optional("tags", serde_json::Value::Array(Vec::new()))],
        processor::tags,
    );
}
