// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// `RUST_LOG` wins over the configured level when it is set and parses.
fn build_env_filter(level: &str) -> Result<EnvFilter> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    env_filter_from(level, rust_log.as_deref())
}

fn env_filter_from(level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(filter);
    }
    let directives = format!("{level},rusqlite=warn");
    EnvFilter::try_new(&directives)
        .map_err(|error| anyhow!("invalid tracing filter {directives:?}: {error}"))
}

/// Sends tracing output to `file`. The terminal belongs to the UI, so there
/// is no console layer.
pub fn init_logging(level: &str, file: &Path) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("open log file {}", file.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(build_env_filter(level)?)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;

    tracing::debug!(level, file = %file.display(), "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::env_filter_from;

    #[test]
    fn configured_level_builds_filter() {
        assert!(env_filter_from("debug", None).is_ok());
        assert!(env_filter_from("warn", None).is_ok());
    }

    #[test]
    fn rust_log_overrides_configured_level() {
        let filter = env_filter_from("info", Some("trace")).expect("override parses");
        assert!(filter.to_string().contains("trace"));
        assert!(!filter.to_string().contains("rusqlite"));
    }

    #[test]
    fn unparsable_rust_log_falls_back_to_level() {
        let filter = env_filter_from("warn", Some("inventory=loud")).expect("fallback parses");
        assert!(filter.to_string().contains("rusqlite=warn"));
    }

    #[test]
    fn invalid_level_is_reported() {
        let error = env_filter_from("inventory=loud", None).expect_err("bad level should fail");
        assert!(error.to_string().contains("invalid tracing filter"));
    }
}
