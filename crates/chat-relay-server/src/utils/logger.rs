use anyhow::{Context, Result};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber: stdout plus an optional daily rolling file
pub fn init_logger(config: &LoggingConfig) -> Result<()> {
    let directives = resolve_filter(&config.level, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter '{}'", directives))?;

    let mut layers = vec![stdout_layer(config.format)];
    if let Some(dir) = &config.directory {
        // <dir>/<prefix>.<date>.log
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(config.file_prefix.clone())
            .filename_suffix("log")
            .build(dir)
            .with_context(|| format!("Failed to open log directory {}", dir.display()))?;
        layers.push(file_layer(config.format, appender));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(())
}

/// `RUST_LOG` wins over the configured level when it is set and non-blank
fn resolve_filter(configured: &str, rust_log: Option<String>) -> String {
    match rust_log {
        Some(value) if !value.trim().is_empty() => value,
        _ => configured.to_string(),
    }
}

fn stdout_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stdout)
            .with_target(true)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, appender: RollingFileAppender) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(appender)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(appender)
            .with_target(true)
            .with_ansi(false)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_used_without_rust_log() {
        assert_eq!(resolve_filter("warn,chat_relay_server=info", None), "warn,chat_relay_server=info");
        assert_eq!(resolve_filter("warn", Some("   ".to_string())), "warn");
    }

    #[test]
    fn test_rust_log_overrides_configured_level() {
        assert_eq!(resolve_filter("warn", Some("trace".to_string())), "trace");
    }

    #[test]
    fn test_default_level_is_a_valid_filter() {
        let config = LoggingConfig::default();
        assert!(EnvFilter::try_new(resolve_filter(&config.level, None)).is_ok());
    }
}
