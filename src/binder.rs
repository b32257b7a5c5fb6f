//! Constructor binding: turn a type name plus a loose argument map into a
//! constructed instance.
//!
//! Every pluggable type registers a [`Factory`] that declares its parameters.
//! Binding matches each declared parameter against the argument map, first by
//! its camelCase spelling and then by its snake_case spelling, falls back to
//! the declared default, and hands the resulting [`BoundArgs`] to the factory.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::case::{camel_case, snake_case};
use crate::types::Kind;
use crate::{Arguments, Error, Formatter, Level, Processor, Result};

/// Look up the value configured for a constructor parameter.
///
/// The camelCase spelling of `name` wins over the snake_case one. A JSON
/// `null` is treated as absent.
pub fn lookup_arg<'a>(args: &'a Arguments, name: &str) -> Option<&'a Value> {
    let present = |key: String| args.get(&key).filter(|v| !v.is_null());
    present(camel_case(name)).or_else(|| present(snake_case(name)))
}

/// A declared constructor parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    name: String,
    default: Option<Value>,
}

impl Param {
    /// A parameter that must be configured.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter with a default value. Use `Value::Null` for "no value".
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// Live components handed to a factory alongside its arguments.
#[derive(Default)]
pub struct Injected {
    pub formatter: Option<Arc<dyn Formatter>>,
    pub processors: Vec<Arc<dyn Processor>>,
}

impl Injected {
    pub fn is_empty(&self) -> bool {
        self.formatter.is_none() && self.processors.is_empty()
    }
}

impl fmt::Debug for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injected")
            .field("formatter", &self.formatter.is_some())
            .field("processors", &self.processors.len())
            .finish()
    }
}

/// Arguments resolved for one construction, keyed by declared parameter name.
#[derive(Debug)]
pub struct BoundArgs {
    type_name: String,
    values: Arguments,
    injected: Injected,
}

impl BoundArgs {
    /// Name of the type being constructed.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The bound value of a parameter, `None` when absent or null.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|v| !v.is_null())
    }

    /// The bound value of a parameter, failing if there is none.
    pub fn value(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| Error::MissingArgument {
            parameter: name.to_string(),
            type_name: self.type_name.clone(),
        })
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        self.value(name)?
            .as_str()
            .ok_or_else(|| self.invalid(name, "expected a string"))
    }

    pub fn string(&self, name: &str) -> Result<String> {
        self.str(name).map(str::to_string)
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        self.value(name)?
            .as_bool()
            .ok_or_else(|| self.invalid(name, "expected a boolean"))
    }

    pub fn u64(&self, name: &str) -> Result<u64> {
        self.value(name)?
            .as_u64()
            .ok_or_else(|| self.invalid(name, "expected a non-negative integer"))
    }

    pub fn level(&self, name: &str) -> Result<Level> {
        self.str(name)?
            .parse()
            .map_err(|reason: String| self.invalid(name, &reason))
    }

    /// A list of strings; a single string is accepted as a one-element list.
    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        match self.value(name)? {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(name, "expected a list of strings"))
                })
                .collect(),
            _ => Err(self.invalid(name, "expected a list of strings")),
        }
    }

    /// Deserialize a parameter into any serde type.
    pub fn deserialize<D: DeserializeOwned>(&self, name: &str) -> Result<D> {
        let value = self.value(name)?.clone();
        serde_json::from_value(value).map_err(|e| self.invalid(name, &e.to_string()))
    }

    /// Take the injected formatter. Whatever is not taken here is attached
    /// after construction instead.
    pub fn take_formatter(&mut self) -> Option<Arc<dyn Formatter>> {
        self.injected.formatter.take()
    }

    /// Take the injected processors.
    pub fn take_processors(&mut self) -> Vec<Arc<dyn Processor>> {
        std::mem::take(&mut self.injected.processors)
    }

    pub(crate) fn invalid(&self, name: &str, reason: &str) -> Error {
        Error::InvalidArgument {
            parameter: name.to_string(),
            type_name: self.type_name.clone(),
            reason: reason.to_string(),
        }
    }
}

type Build<T> = dyn Fn(&mut BoundArgs) -> Result<T> + Send + Sync;

/// A registered constructor: declared parameters plus the build function.
pub struct Factory<T> {
    params: Vec<Param>,
    build: Box<Build<T>>,
}

impl<T> Factory<T> {
    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

/// Type name → factory map for one kind of component.
pub struct TypeRegistry<T> {
    kind: Kind,
    factories: HashMap<String, Factory<T>>,
}

impl<T> TypeRegistry<T> {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            factories: HashMap::new(),
        }
    }

    /// Register a type, replacing any previous factory under the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, params: &[Param], build: F)
    where
        F: Fn(&mut BoundArgs) -> Result<T> + Send + Sync + 'static,
    {
        self.factories.insert(
            name.into(),
            Factory {
                params: params.to_vec(),
                build: Box::new(build),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn factory(&self, name: &str) -> Option<&Factory<T>> {
        self.factories.get(name)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Construct an instance of `type_name` from `args`.
    pub fn bind(&self, type_name: &str, args: &Arguments) -> Result<T> {
        self.bind_with(type_name, args, Injected::default())
            .map(|(instance, _)| instance)
    }

    /// Construct an instance with live dependencies available to the factory.
    /// Returns the dependencies the factory left untouched.
    pub(crate) fn bind_with(
        &self,
        type_name: &str,
        args: &Arguments,
        injected: Injected,
    ) -> Result<(T, Injected)> {
        let factory = self.factory(type_name).ok_or_else(|| Error::UnknownType {
            kind: self.kind,
            name: type_name.to_string(),
        })?;

        // Parameterless types are built bare, whatever the configuration says.
        let values = if factory.params.is_empty() {
            Arguments::new()
        } else {
            bind_params(type_name, &factory.params, args)?
        };

        let mut bound = BoundArgs {
            type_name: type_name.to_string(),
            values,
            injected,
        };
        let instance = (factory.build)(&mut bound)?;
        Ok((instance, bound.injected))
    }
}

impl<T> fmt::Debug for TypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry")
            .field("kind", &self.kind)
            .field("types", &names)
            .finish()
    }
}

fn bind_params(type_name: &str, params: &[Param], args: &Arguments) -> Result<Arguments> {
    let mut values = Arguments::new();

    for param in params {
        let value = match (lookup_arg(args, &param.name), &param.default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(Error::MissingArgument {
                    parameter: param.name.clone(),
                    type_name: type_name.to_string(),
                });
            }
        };
        values.insert(param.name.clone(), value);
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[derive(Debug, PartialEq)]
    struct Buffer {
        threshold: u64,
        log_file: String,
    }

    fn buffers() -> TypeRegistry<Buffer> {
        let mut registry = TypeRegistry::new(Kind::Handler);
        registry.register(
            "buffer",
            &[Param::required("threshold"), Param::optional("logFile", "app.log")],
            |args| {
                Ok(Buffer {
                    threshold: args.u64("threshold")?,
                    log_file: args.string("logFile")?,
                })
            },
        );
        registry
    }

    #[test]
    fn test_lookup_arg_accepts_both_spellings() {
        let camel = args(json!({"logFile": "a.log"}));
        let snake = args(json!({"log_file": "b.log"}));
        let neither = args(json!({"logfile": "c.log"}));

        assert_eq!(lookup_arg(&camel, "logFile"), Some(&json!("a.log")));
        assert_eq!(lookup_arg(&snake, "logFile"), Some(&json!("b.log")));
        assert_eq!(lookup_arg(&camel, "log_file"), Some(&json!("a.log")));
        assert_eq!(lookup_arg(&neither, "logFile"), None);
    }

    #[test]
    fn test_lookup_arg_prefers_camel_case() {
        let both = args(json!({"logFile": "camel.log", "log_file": "snake.log"}));
        assert_eq!(lookup_arg(&both, "log_file"), Some(&json!("camel.log")));
    }

    #[test]
    fn test_lookup_arg_treats_null_as_absent() {
        let nulls = args(json!({"logFile": null, "log_file": "snake.log"}));
        assert_eq!(lookup_arg(&nulls, "logFile"), Some(&json!("snake.log")));
    }

    #[test]
    fn test_bind_applies_defaults() {
        let buffer = buffers().bind("buffer", &args(json!({"threshold": 3}))).unwrap();
        assert_eq!(
            buffer,
            Buffer {
                threshold: 3,
                log_file: "app.log".to_string()
            }
        );
    }

    #[test]
    fn test_bind_matches_snake_case_key() {
        let buffer = buffers()
            .bind("buffer", &args(json!({"threshold": 1, "log_file": "x.log"})))
            .unwrap();
        assert_eq!(buffer.log_file, "x.log");
    }

    #[test]
    fn test_bind_missing_required_argument() {
        let err = buffers().bind("buffer", &args(json!({"log_file": "x.log"}))).unwrap_err();
        match err {
            Error::MissingArgument {
                parameter,
                type_name,
            } => {
                assert_eq!(parameter, "threshold");
                assert_eq!(type_name, "buffer");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bind_unknown_type() {
        let err = buffers().bind("nope", &Arguments::new()).unwrap_err();
        assert!(matches!(err, Error::UnknownType { kind: Kind::Handler, .. }));
    }

    #[test]
    fn test_bind_invalid_argument() {
        let err = buffers()
            .bind("buffer", &args(json!({"threshold": "lots"})))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_parameterless_type_ignores_arguments() {
        let mut registry: TypeRegistry<usize> = TypeRegistry::new(Kind::Formatter);
        registry.register("bare", &[], |args| Ok(args.values.len()));

        let built = registry
            .bind("bare", &args(json!({"anything": 1, "else": 2})))
            .unwrap();
        assert_eq!(built, 0);
    }

    #[test]
    fn test_bound_args_strings() {
        let mut registry: TypeRegistry<Vec<String>> = TypeRegistry::new(Kind::Processor);
        registry.register("tags", &[Param::optional("tags", json!([]))], |args| {
            args.strings("tags")
        });

        assert_eq!(
            registry.bind("tags", &args(json!({"tags": ["a", "b"]}))).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(
            registry.bind("tags", &args(json!({"tags": "solo"}))).unwrap(),
            vec!["solo"]
        );
        assert!(registry.bind("tags", &Arguments::new()).unwrap().is_empty());
    }

    #[test]
    fn test_untaken_dependencies_are_returned() {
        let mut registry: TypeRegistry<usize> = TypeRegistry::new(Kind::Handler);
        registry.register("takes", &[], |args| Ok(args.take_processors().len()));
        registry.register("leaves", &[], |_| Ok(0));

        let processor: Arc<dyn Processor> = Arc::new(|r: Record| r);
        let injected = || Injected {
            formatter: None,
            processors: vec![processor.clone()],
        };

        let (taken, rest) = registry.bind_with("takes", &Arguments::new(), injected()).unwrap();
        assert_eq!(taken, 1);
        assert!(rest.is_empty());

        let (_, rest) = registry.bind_with("leaves", &Arguments::new(), injected()).unwrap();
        assert_eq!(rest.processors.len(), 1);
    }
}
