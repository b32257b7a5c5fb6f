//! Subscriber setup for the crate's own diagnostics.
//!
//! Parsing, resolution and cache hits are reported through `tracing` under the
//! `logwire` target. Applications that already install a subscriber get these
//! events for free; the others can call [`init_diagnostics`].

use crate::{Error, Result};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global fmt subscriber at `level`, as text or JSON.
///
/// `RUST_LOG` takes precedence over `level` when set. Fails with
/// [`Error::Init`] if a global subscriber is already installed.
pub fn init_diagnostics(level: &str, json: bool) -> Result<()> {
    let spec = effective_filter(level);
    let env_filter = EnvFilter::try_new(&spec).map_err(|e| Error::Init(e.to_string()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(cfg!(feature = "ansi"));

    let fmt_layer = if json {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Init(e.to_string()))?;

    Ok(())
}

fn effective_filter(level: &str) -> String {
    if let Ok(rust_log) = std::env::var("RUST_LOG")
        && !rust_log.is_empty()
    {
        return rust_log;
    }

    if level.is_empty() {
        "info,logwire=info".to_string()
    } else {
        format!("{level},logwire={level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // RUST_LOG is process-wide
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_rust_log<R>(value: Option<&str>, f: impl FnOnce() -> R) -> R {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let prev = std::env::var_os("RUST_LOG");
        unsafe {
            match value {
                Some(v) => std::env::set_var("RUST_LOG", v),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
        let out = f();
        unsafe {
            match prev {
                Some(v) => std::env::set_var("RUST_LOG", v),
                None => std::env::remove_var("RUST_LOG"),
            }
        }
        out
    }

    #[test]
    fn rust_log_overrides_level() {
        let spec = with_rust_log(Some("trace"), || effective_filter("info"));
        assert_eq!(spec, "trace");
    }

    #[test]
    fn level_applies_to_crate_target() {
        let spec = with_rust_log(None, || effective_filter("warn"));
        assert_eq!(spec, "warn,logwire=warn");
    }

    #[test]
    fn empty_rust_log_is_ignored() {
        let spec = with_rust_log(Some(""), || effective_filter("debug"));
        assert_eq!(spec, "debug,logwire=debug");
    }

    #[test]
    fn empty_level_defaults_to_info() {
        let spec = with_rust_log(None, || effective_filter(""));
        assert_eq!(spec, "info,logwire=info");
    }

    #[test]
    fn init_twice_reports_init_error() {
        let _ = with_rust_log(None, || init_diagnostics("off", false));
        let second = with_rust_log(None, || init_diagnostics("off", true));
        assert!(matches!(second, Err(Error::Init(_))));
    }
}
