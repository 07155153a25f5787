//! Tracing initialisation: one fmt layer (level, target, span, fields) written to stdout and,
//! when a path is given, appended to a log file as well.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::FmtSpan, fmt::writer::MakeWriterExt, layer::SubscriberExt,
    util::SubscriberInitExt, EnvFilter, Registry,
};

/// Installs the global subscriber. Level comes from `RUST_LOG` (default `info`); load `.env`
/// before calling this or `RUST_LOG` from the file is ignored.
pub fn init_tracing(log_file_path: Option<&str>) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    let registry = Registry::default().with(env_filter);
    let result = match log_file_path {
        Some(path) => {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            registry
                .with(fmt_layer.with_writer(io::stdout.and(file)))
                .try_init()
        }
        None => registry.with(fmt_layer.with_writer(io::stdout)).try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("bot.log");
        // A subscriber may already be installed by another test; only the file side effect matters.
        let _ = init_tracing(Some(path.to_str().unwrap()));
        assert!(path.exists());
    }
}
