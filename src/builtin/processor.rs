use serde_json::Value;

use crate::binder::BoundArgs;
use crate::builtin::formatter::scalar;
use crate::{Processor, Record, Result};

/// Interpolates `{key}` placeholders in the message from the record context.
#[derive(Debug, Clone, Default)]
pub struct PsrMessage {
    remove_used_context_fields: bool,
}

impl PsrMessage {
    pub fn new(remove_used_context_fields: bool) -> Self {
        Self {
            remove_used_context_fields,
        }
    }
}

impl Processor for PsrMessage {
    fn process(&self, mut record: Record) -> Record {
        if !record.message.contains('{') {
            return record;
        }

        let mut used = Vec::new();
        let mut out = String::with_capacity(record.message.len());
        let mut rest = record.message.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) if record.context.contains_key(&after[..end]) => {
                    let key = &after[..end];
                    out.push_str(&scalar(&record.context[key]));
                    used.push(key.to_string());
                    rest = &after[end + 1..];
                }
                _ => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);

        record.message = out;
        if self.remove_used_context_fields {
            for key in used {
                record.context.remove(&key);
            }
        }
        record
    }
}

/// Adds a fixed list of tags to `extra.tags`.
#[derive(Debug, Clone, Default)]
pub struct Tags {
    tags: Vec<String>,
}

impl Tags {
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }
}

impl Processor for Tags {
    fn process(&self, mut record: Record) -> Record {
        let entry = record
            .extra
            .entry("tags")
            .or_insert_with(|| Value::Array(Vec::new()));

        match entry {
            Value::Array(existing) => {
                existing.extend(self.tags.iter().cloned().map(Value::String));
            }
            other => {
                let mut tags = vec![other.take()];
                tags.extend(self.tags.iter().cloned().map(Value::String));
                *other = Value::Array(tags);
            }
        }
        record
    }
}

pub(crate) fn psr_message(args: &mut BoundArgs) -> Result<Box<dyn Processor>> {
    Ok(Box::new(PsrMessage::new(
        args.bool("remove_used_context_fields")?,
    )))
}

pub(crate) fn tags(args: &mut BoundArgs) -> Result<Box<dyn Processor>> {
    Ok(Box::new(Tags::new(args.strings("tags")?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;
    use serde_json::json;

    fn record(message: &str) -> Record {
        let mut record = Record::new("app", Level::Info, message);
        record.context.insert("user".to_string(), json!("alice"));
        record.context.insert("attempts".to_string(), json!(3));
        record
    }

    #[test]
    fn test_psr_message_interpolates() {
        let out = PsrMessage::default().process(record("{user} failed {attempts} times"));
        assert_eq!(out.message, "alice failed 3 times");
        assert_eq!(out.context.len(), 2);
    }

    #[test]
    fn test_psr_message_keeps_unknown_placeholders() {
        let out = PsrMessage::default().process(record("{user} {missing} {"));
        assert_eq!(out.message, "alice {missing} {");
    }

    #[test]
    fn test_psr_message_removes_used_fields() {
        let out = PsrMessage::new(true).process(record("hi {user}"));
        assert_eq!(out.message, "hi alice");
        assert!(!out.context.contains_key("user"));
        assert!(out.context.contains_key("attempts"));
    }

    #[test]
    fn test_tags_appends() {
        let tags = Tags::new(vec!["web".to_string(), "eu".to_string()]);
        let once = tags.process(record("x"));
        assert_eq!(once.extra["tags"], json!(["web", "eu"]));

        let twice = tags.process(once);
        assert_eq!(twice.extra["tags"], json!(["web", "eu", "web", "eu"]));
    }
}
