//! Logging initialization with optional file-based daily rotation.
//!
//! Every event is rendered together with the active diagnostic context
//! (see [`crate::diagnostic`]): the text format prefixes `[key=value ...]`,
//! the JSON format adds a `context` object.

use crate::diagnostic::{self, Fields};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, reload};

/// Rendering of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Handle that swaps the active level filter at runtime (SIGHUP reload).
#[derive(Clone)]
pub struct LevelReloader {
    handle: reload::Handle<EnvFilter, Registry>,
    /// The filter came from `RUST_LOG`, which configured levels never override.
    env_pinned: bool,
}

impl LevelReloader {
    pub fn new(handle: reload::Handle<EnvFilter, Registry>, env_pinned: bool) -> Self {
        Self { handle, env_pinned }
    }

    pub fn set_level(&self, level: &str) -> anyhow::Result<()> {
        let filter = EnvFilter::try_new(level)?;
        self.handle.reload(filter)?;
        Ok(())
    }

    /// Apply a `log-level` read from the config file. Returns `Ok(false)`
    /// and leaves the filter alone when `RUST_LOG` is in charge.
    pub fn apply_config_level(&self, level: &str) -> anyhow::Result<bool> {
        if self.env_pinned {
            return Ok(false);
        }
        self.set_level(level)?;
        Ok(true)
    }
}

/// Keeps the logging pipeline alive. The non-blocking file writer flushes its
/// buffer when this is dropped, so hold it for the lifetime of the process.
pub struct LoggingGuard {
    pub reloader: LevelReloader,
    _worker: Option<WorkerGuard>,
}

/// Initialize the tracing subscriber.
///
/// - `to_file=true` → daily rotating file appender with non-blocking writer
/// - `to_file=false` → stderr output (default)
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(
    level: &str,
    format: LogFormat,
    to_file: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<LoggingGuard> {
    let (env_filter, env_pinned) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(level), false),
    };
    let (filter, handle) = reload::Layer::new(env_filter);

    let (writer, worker) = if to_file {
        let dir = log_dir.unwrap_or("./logs");
        let file_appender = tracing_appender::rolling::daily(dir, "hello-actions.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stderr), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(format, !to_file, writer))
        .try_init()?;

    Ok(LoggingGuard {
        reloader: LevelReloader::new(handle, env_pinned),
        _worker: worker,
    })
}

/// Formatting layer that decorates events with the diagnostic context.
pub fn fmt_layer<S, W>(
    format: LogFormat,
    ansi: bool,
    writer: W,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .event_format(DiagnosticFormat::new(
                tracing_subscriber::fmt::format(),
                LogFormat::Text,
            ))
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .event_format(DiagnosticFormat::new(
                tracing_subscriber::fmt::format().json(),
                LogFormat::Json,
            ))
            .boxed(),
    }
}

/// Event formatter wrapping a stock `tracing_subscriber` format.
pub struct DiagnosticFormat<E> {
    inner: E,
    format: LogFormat,
}

impl<E> DiagnosticFormat<E> {
    pub fn new(inner: E, format: LogFormat) -> Self {
        Self { inner, format }
    }
}

impl<S, N, E> FormatEvent<S, N> for DiagnosticFormat<E>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    E: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let fields = diagnostic::snapshot();
        if fields.is_empty() {
            return self.inner.format_event(ctx, writer, event);
        }

        match self.format {
            LogFormat::Text => {
                writer.write_char('[')?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        writer.write_char(' ')?;
                    }
                    write!(writer, "{key}={value}")?;
                }
                writer.write_str("] ")?;
                self.inner.format_event(ctx, writer, event)
            }
            LogFormat::Json => {
                let mut line = String::new();
                self.inner
                    .format_event(ctx, Writer::new(&mut line), event)?;
                writeln!(writer, "{}", merge_context(&line, &fields))
            }
        }
    }
}

/// Adds a `context` object to a rendered JSON line. Lines that are not a JSON
/// object are passed through untouched.
fn merge_context(line: &str, fields: &Fields) -> String {
    let line = line.trim_end();
    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(serde_json::Value::Object(mut map)) => {
            let context: serde_json::Map<String, serde_json::Value> = fields
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("context".to_string(), serde_json::Value::Object(context));
            serde_json::Value::Object(map).to_string()
        }
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    fn capture_events(format: LogFormat, emit: impl FnOnce()) -> Vec<String> {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber =
            tracing_subscriber::registry().with(fmt_layer(format, false, move || writer.clone()));
        tracing::subscriber::with_default(subscriber, emit);
        capture.lines()
    }

    #[test]
    fn test_config_level_ignored_when_env_pinned() {
        let (layer, handle) = reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new("warn"));
        let _subscriber = tracing_subscriber::registry().with(layer);
        let active = || handle.with_current(|f| f.to_string()).unwrap();

        let pinned = LevelReloader::new(handle.clone(), true);
        assert!(!pinned.apply_config_level("trace").unwrap());
        assert_eq!(active(), "warn");

        let free = LevelReloader::new(handle.clone(), false);
        assert!(free.apply_config_level("debug").unwrap());
        assert_eq!(active(), "debug");
    }

    #[test]
    fn test_json_lines_carry_context() {
        let lines = capture_events(LogFormat::Json, || {
            diagnostic::sync_scope(|| {
                diagnostic::put("correlationId", "abc");
                diagnostic::put("requestParam.name", "Ada");
                tracing::info!("inside");
            });
            tracing::info!("outside");
        });
        assert_eq!(lines.len(), 2);

        let inside: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(inside["fields"]["message"], "inside");
        assert_eq!(inside["context"]["correlationId"], "abc");
        assert_eq!(inside["context"]["requestParam.name"], "Ada");

        let outside: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(outside["fields"]["message"], "outside");
        assert!(outside.get("context").is_none());
    }

    #[test]
    fn test_text_lines_carry_context_prefix() {
        let lines = capture_events(LogFormat::Text, || {
            diagnostic::sync_scope(|| {
                diagnostic::put("method", "GET");
                diagnostic::put("correlationId", "abc");
                tracing::warn!("inside");
            });
            tracing::warn!("outside");
        });
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[correlationId=abc method=GET] "), "{}", lines[0]);
        assert!(lines[0].ends_with("inside"));
        assert!(!lines[1].starts_with('['));
    }

    #[test]
    fn test_cleared_context_is_not_rendered() {
        let lines = capture_events(LogFormat::Json, || {
            diagnostic::sync_scope(|| {
                diagnostic::put("correlationId", "abc");
                diagnostic::clear();
                tracing::info!("after clear");
            });
        });
        let line: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert!(line.get("context").is_none());
    }

    #[test]
    fn test_merge_context_passes_through_non_objects() {
        let mut fields = Fields::new();
        fields.insert("k".to_string(), "v".to_string());
        assert_eq!(merge_context("not json\n", &fields), "not json");
        assert_eq!(merge_context("{\"a\":1}\n", &fields), "{\"a\":1,\"context\":{\"k\":\"v\"}}");
    }

    #[test]
    fn test_log_format_deserializes_lowercase() {
        let format: LogFormat = serde_yaml_ng::from_str("json").unwrap();
        assert_eq!(format, LogFormat::Json);
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}
