use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::OwnedFormatItem;
use time::macros::format_description;
use time::format_description::well_known::Rfc3339;

use crate::binder::BoundArgs;
use crate::{Arguments, Formatter, Record, Result};

/// Default line layout.
pub const SIMPLE_FORMAT: &str = "[%datetime%] %channel%.%level_name%: %message% %context% %extra%\n";
/// Default timestamp layout, in `time` format description syntax.
pub const SIMPLE_DATE: &str = "[year]-[month]-[day]T[hour]:[minute]:[second]";

/// Renders a record on a single line by substituting `%placeholder%` tokens.
///
/// Supported tokens: `%datetime%`, `%channel%`, `%level_name%`, `%message%`,
/// `%context%`, `%extra%`, and `%context.KEY%` / `%extra.KEY%` for single
/// values. Unknown tokens are left as they are.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    format: String,
    date_items: OwnedFormatItem,
    allow_inline_line_breaks: bool,
    ignore_empty_context_and_extra: bool,
}

impl LineFormatter {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            ..Self::default()
        }
    }

    /// Set the timestamp layout; fails if the description does not parse.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Result<Self> {
        self.date_items = time::format_description::parse_owned::<1>(&date_format.into())
            .map_err(time::error::Error::from)?;
        Ok(self)
    }

    pub fn with_inline_line_breaks(mut self, allow: bool) -> Self {
        self.allow_inline_line_breaks = allow;
        self
    }

    pub fn with_ignore_empty_context_and_extra(mut self, ignore: bool) -> Self {
        self.ignore_empty_context_and_extra = ignore;
        self
    }

    pub(crate) fn from_args(args: &BoundArgs) -> Result<Self> {
        Ok(Self::new(args.str("format")?)
            .with_date_format(args.str("date_format")?)?
            .with_inline_line_breaks(args.bool("allow_inline_line_breaks")?)
            .with_ignore_empty_context_and_extra(args.bool("ignore_empty_context_and_extra")?))
    }

    fn render_datetime(&self, datetime: &OffsetDateTime) -> Result<String> {
        Ok(datetime
            .format(&self.date_items)
            .map_err(time::error::Error::from)?)
    }

    fn render_map(&self, map: &Arguments) -> Result<String> {
        if map.is_empty() {
            if self.ignore_empty_context_and_extra {
                return Ok(String::new());
            }
            return Ok("[]".to_string());
        }
        Ok(serde_json::to_string(map)?)
    }

    fn render_message(&self, message: &str) -> String {
        if self.allow_inline_line_breaks {
            message.to_string()
        } else {
            message.replace("\r\n", " ").replace(['\r', '\n'], " ")
        }
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self {
            format: SIMPLE_FORMAT.to_string(),
            // Same layout as SIMPLE_DATE, checked at compile time.
            date_items: OwnedFormatItem::from(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second]"
            )),
            allow_inline_line_breaks: false,
            ignore_empty_context_and_extra: false,
        }
    }
}

impl Formatter for LineFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        let datetime = self.render_datetime(&record.datetime)?;
        let context = self.render_map(&record.context)?;
        let extra = self.render_map(&record.extra)?;
        let message = self.render_message(&record.message);

        Ok(substitute(&self.format, |token| match token {
            "datetime" => Some(datetime.clone()),
            "channel" => Some(record.channel.clone()),
            "level_name" => Some(record.level.name().to_string()),
            "message" => Some(message.clone()),
            "context" => Some(context.clone()),
            "extra" => Some(extra.clone()),
            _ => {
                if let Some(key) = token.strip_prefix("context.") {
                    record.context.get(key).map(scalar)
                } else if let Some(key) = token.strip_prefix("extra.") {
                    record.extra.get(key).map(scalar)
                } else {
                    None
                }
            }
        }))
    }
}

/// Renders a record as one JSON object.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    append_newline: bool,
}

impl JsonFormatter {
    pub fn new(append_newline: bool) -> Self {
        Self { append_newline }
    }

    pub(crate) fn from_args(args: &BoundArgs) -> Result<Self> {
        Ok(Self::new(args.bool("append_newline")?))
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        let datetime = record
            .datetime
            .format(&Rfc3339)
            .map_err(time::error::Error::from)?;
        let value = json!({
            "message": record.message,
            "context": record.context,
            "level": record.level,
            "level_name": record.level.name(),
            "channel": record.channel,
            "datetime": datetime,
            "extra": record.extra,
        });

        let mut out = serde_json::to_string(&value)?;
        if self.append_newline {
            out.push('\n');
        }
        Ok(out)
    }
}

/// Strings render bare, everything else as JSON.
pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace `%token%` occurrences using `lookup`; unknown tokens stay verbatim.
fn substitute(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => match lookup(&after[..end]) {
                Some(value) => {
                    out.push_str(&value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('%');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out
}
