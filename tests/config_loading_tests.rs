use logwire::{Error, Kind, Level, Logwire, RawConfig};
use serde_json::json;
use std::path::Path;

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read log file")
}

#[test]
fn test_yaml_config_writes_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("logs").join("app.log");

    let yaml = format!(
        r#"
formatters:
  short:
    formatter: line
    format: "%channel%.%level_name%: %message%\n"
processors:
  interpolate:
    processor: psr_message
    removeUsedContextFields: true
handlers:
  file:
    handler: stream
    stream: "{}"
    level: info
    formatter: short
channels:
  app:
    handlers: [file]
    processors: [interpolate]
default: app
"#,
        log_path.display()
    );

    let raw: RawConfig = serde_yaml::from_str(&yaml).expect("parse yaml");
    let logwire = Logwire::new(raw).expect("valid config");
    let logger = logwire.default_logger().expect("default channel");

    assert!(!logger.debug("too quiet").unwrap());

    let context = json!({"user": "ada"}).as_object().cloned().unwrap();
    assert!(logger.log(Level::Error, "{user} logged in", context).unwrap());
    assert!(logger.warning("second line").unwrap());

    assert_eq!(
        read(&log_path),
        "app.ERROR: ada logged in\napp.WARNING: second line\n"
    );
}

#[test]
fn test_toml_config_with_json_formatter() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("audit.jsonl");

    let toml_src = format!(
        r#"
default = "audit"

[formatters.structured]
formatter = "json"

[processors.labels]
processor = "tags"
tags = ["security"]

[handlers.jsonl]
handler = "stream"
stream = '{}'
formatter = "structured"
processors = ["labels"]

[channels.audit]
handlers = ["jsonl"]
"#,
        log_path.display()
    );

    let raw: RawConfig = toml::from_str(&toml_src).expect("parse toml");
    let logwire = Logwire::new(raw).expect("valid config");
    logwire
        .channel("audit")
        .expect("audit channel")
        .notice("password changed")
        .unwrap();

    let contents = read(&log_path);
    let line = contents.lines().next().expect("one record");
    let record: serde_json::Value = serde_json::from_str(line).expect("json line");
    assert_eq!(record["channel"], "audit");
    assert_eq!(record["level_name"], "NOTICE");
    assert_eq!(record["message"], "password changed");
    assert_eq!(record["extra"]["tags"], json!(["security"]));
}

#[test]
fn test_yaml_reference_errors_surface_at_parse() {
    let yaml = r#"
handlers:
  console:
    handler: stream
    stream: stderr
    formatter: missing
"#;
    let raw: RawConfig = serde_yaml::from_str(yaml).expect("parse yaml");
    let err = Logwire::new(raw).unwrap_err();
    assert!(matches!(err, Error::UnconfiguredFormatter(id) if id == "missing"));

    let yaml = r#"
channels:
  app:
    handlers: [nowhere]
"#;
    let raw: RawConfig = serde_yaml::from_str(yaml).expect("parse yaml");
    let err = Logwire::new(raw).unwrap_err();
    assert!(matches!(err, Error::UnconfiguredHandler(id) if id == "nowhere"));
}

#[test]
fn test_components_are_built_lazily() {
    let yaml = r#"
handlers:
  broken:
    handler: stream
  quiet:
    handler: "null"
channels:
  ok:
    handlers: [quiet]
  bad:
    handlers: [broken]
"#;
    let raw: RawConfig = serde_yaml::from_str(yaml).expect("parse yaml");
    let logwire = Logwire::new(raw).expect("missing arguments are only found on use");

    assert!(logwire.channel("ok").is_ok());
    assert!(!logwire.registry().is_resolved(Kind::Handler, "broken"));

    let err = logwire.channel("bad").unwrap_err();
    assert!(matches!(err, Error::MissingArgument { parameter, .. } if parameter == "stream"));
}

#[test]
fn test_memory_handler_is_readable_and_capped() {
    let yaml = r#"
formatters:
  bare:
    format: "%message%"
handlers:
  recent:
    handler: memory
    buffer: recent
    maxLines: 100
    formatter: bare
channels:
  app:
    handlers: [recent]
"#;
    let raw: RawConfig = serde_yaml::from_str(yaml).expect("parse yaml");
    let logwire = Logwire::new(raw).expect("valid config");
    let logger = logwire.channel("app").expect("app channel");

    for n in 0..1000 {
        logger.info(format!("record {n}")).unwrap();
    }

    let lines = logwire.memory("recent").expect("buffer").lines();
    assert_eq!(lines.len(), 100);
    assert_eq!(lines.first().map(String::as_str), Some("record 900"));
    assert_eq!(lines.last().map(String::as_str), Some("record 999"));
}
