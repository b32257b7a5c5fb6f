//! Loads `demos/config.yaml` and logs through two channels.
//!
//! ```sh
//! RUST_LOG=logwire=debug cargo run --example channels
//! ```

use logwire::{Level, LogwireBuilder, RawConfig, Record};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logwire::init_diagnostics("warn", false)?;

    let raw: RawConfig = serde_yaml::from_str(include_str!("config.yaml"))?;
    let logwire = LogwireBuilder::from_config(raw)
        .with_processor("request_id", |mut record: Record| {
            record.extra.insert("request_id".to_string(), json!("r-42"));
            record
        })
        .build()?;

    let app = logwire.default_logger()?;
    app.info("service started")?;
    app.log(
        Level::Notice,
        "{user} opened invoice {invoice}",
        json!({"user": "ada", "invoice": 1017})
            .as_object()
            .cloned()
            .unwrap_or_default(),
    )?;

    let audit = logwire.channel("audit")?;
    audit.debug("not for the audit trail")?;
    audit.warning("refund issued")?;

    Ok(())
}
