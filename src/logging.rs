use std::{fs::OpenOptions, io, path::Path, sync::Arc};

use tracing::{dispatcher, level_filters::LevelFilter, Dispatch};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::types::LogSettings;

/// Log sink owned by whoever does the logging. Events emitted inside
/// `in_scope` go to stderr at the configured level and, when the file
/// could be opened, to an append-only log file at debug level.
///
/// No global subscriber is installed; two `TradeLog`s never see each
/// other's events.
#[derive(Clone)]
pub struct TradeLog {
    dispatch: Dispatch,
    _guard: Option<Arc<WorkerGuard>>,
}

impl TradeLog {
    pub fn open(settings: &LogSettings) -> Self {
        // RUST_LOG overrides the configured console level
        let console_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&settings.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let console = fmt::layer()
            .with_writer(io::stderr)
            .without_time()
            .with_target(false)
            .with_filter(console_filter);

        let (file, guard, file_error) = match open_append(&settings.file) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(LevelFilter::DEBUG);
                (Some(layer), Some(Arc::new(guard)), None)
            }
            Err(e) => (None, None, Some(e)),
        };

        let log = Self {
            dispatch: Dispatch::new(Registry::default().with(console).with(file)),
            _guard: guard,
        };

        if let Some(e) = file_error {
            log.in_scope(|| {
                tracing::warn!(
                    "Could not open log file {}: {}; logging to console only",
                    settings.file.display(),
                    e
                )
            });
        }

        log
    }

    /// Writes only to the given file, nothing to the console.
    pub fn file_only(path: &Path) -> io::Result<Self> {
        let (writer, guard) = tracing_appender::non_blocking(open_append(path)?);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .with_filter(LevelFilter::DEBUG);

        Ok(Self {
            dispatch: Dispatch::new(Registry::default().with(layer)),
            _guard: Some(Arc::new(guard)),
        })
    }

    /// Discards everything.
    pub fn silent() -> Self {
        Self {
            dispatch: Dispatch::none(),
            _guard: None,
        }
    }

    /// Runs `f` with this log as the current dispatcher.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }
}

fn open_append(path: &Path) -> io::Result<std::fs::File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_receives_lines_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("trading_bot.log");

        {
            let log = TradeLog::file_only(&path).unwrap();
            log.in_scope(|| tracing::info!("first session"));
        }
        {
            let log = TradeLog::file_only(&path).unwrap();
            log.in_scope(|| tracing::debug!("second session"));
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("INFO") && lines[0].ends_with("first session"));
        assert!(lines[1].contains("DEBUG") && lines[1].ends_with("second session"));
    }

    #[test]
    fn test_unwritable_file_falls_back_to_console() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as a log file
        let settings = LogSettings {
            file: dir.path().to_path_buf(),
            level: "warn".to_string(),
        };
        let log = TradeLog::open(&settings);
        assert!(log._guard.is_none());
        log.in_scope(|| tracing::info!("still usable"));
    }
}
