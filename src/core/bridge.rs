//! Redirect the `log` and `tracing` facades into a registry
//!
//! Both bridges look up the registry's installed function table on every
//! record, so a later `configure` redirects them without reinstalling.

use super::field::{Field, FieldValue};
use super::log_entry::Caller;
use super::log_level::Level;
use super::registry::Registry;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::field::{Field as TracingField, Visit};
use tracing::subscriber::Interest;
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// `log::Log` implementation writing through a registry.
pub struct LogBridge {
    registry: Weak<Registry>,
}

impl LogBridge {
    pub fn new(registry: &Arc<Registry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.table().external_enabled(metadata.level().into()))
    }

    fn log(&self, record: &log::Record<'_>) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let table = registry.table();
        let level = Level::from(record.level());
        if !table.external_enabled(level) {
            return;
        }

        let file: Option<Cow<'static, str>> = match record.file_static() {
            Some(file) => Some(Cow::Borrowed(file)),
            None => record.file().map(|file| Cow::Owned(file.to_string())),
        };
        let caller = file.zip(record.line()).map(|(file, line)| Caller::new(file, line));

        table.emit_external(level, record.args().to_string(), caller, Vec::new());
    }

    fn flush(&self) {
        if let Some(registry) = self.registry.upgrade() {
            let _ = registry.sync();
        }
    }
}

/// `tracing` layer writing every event through a registry.
///
/// The `message` field becomes the entry message; other fields are kept as
/// structured fields.
pub struct TracingBridge {
    registry: Weak<Registry>,
}

impl TracingBridge {
    pub fn new(registry: &Arc<Registry>) -> Self {
        Self {
            registry: Arc::downgrade(registry),
        }
    }
}

impl<S: Subscriber> Layer<S> for TracingBridge {
    // levels change at runtime, so no callsite may be cached as never
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::sometimes()
    }

    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.table().external_enabled((*metadata.level()).into()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let metadata = event.metadata();
        let level = Level::from(*metadata.level());
        let table = registry.table();
        if !table.external_enabled(level) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let caller = metadata
            .file()
            .zip(metadata.line())
            .map(|(file, line)| Caller::new(file, line));

        table.emit_external(level, collector.message, caller, collector.fields);
    }
}

#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Vec<Field>,
}

impl FieldCollector {
    fn push(&mut self, field: &TracingField, value: FieldValue) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_f64(&mut self, field: &TracingField, value: f64) {
        self.push(field, FieldValue::F64(value));
    }

    fn record_i64(&mut self, field: &TracingField, value: i64) {
        self.push(field, FieldValue::I64(value));
    }

    fn record_u64(&mut self, field: &TracingField, value: u64) {
        self.push(field, FieldValue::U64(value));
    }

    fn record_bool(&mut self, field: &TracingField, value: bool) {
        self.push(field, FieldValue::Bool(value));
    }

    fn record_str(&mut self, field: &TracingField, value: &str) {
        self.push(field, FieldValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &TracingField, value: &dyn fmt::Debug) {
        self.push(field, FieldValue::Str(format!("{:?}", value)));
    }
}

/// Make `registry` the target of the `log` and `tracing` facades.
///
/// Best effort: a facade that already has a logger or global subscriber is
/// left as it is.
pub(crate) fn install(registry: &Arc<Registry>) {
    if log::set_boxed_logger(Box::new(LogBridge::new(registry))).is_ok() {
        log::set_max_level(log::LevelFilter::Trace);
    }

    let subscriber = tracing_subscriber::registry().with(TracingBridge::new(registry));
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::Options;
    use log::Log;
    use std::fs;
    use tempfile::tempdir;

    fn configured(dir: &tempfile::TempDir, options: Options) -> (Arc<Registry>, std::path::PathBuf) {
        let path = dir.path().join("bridge.log");
        let registry = Registry::new();
        registry
            .configure(&options.with_output_path(path.to_str().unwrap()))
            .unwrap();
        (registry, path)
    }

    #[test]
    fn test_log_bridge_respects_level() {
        let dir = tempdir().unwrap();
        let (registry, path) = configured(&dir, Options::default().with_log_caller(true));
        let bridge = LogBridge::new(&registry);

        let debug_meta = log::Metadata::builder().level(log::Level::Debug).build();
        assert!(!bridge.enabled(&debug_meta));

        bridge.log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .args(format_args!("hidden"))
                .build(),
        );
        bridge.log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .args(format_args!("from {}", "log"))
                .file_static(Some("src/legacy/io.rs"))
                .line(Some(42))
                .build(),
        );
        bridge.flush();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains("hidden"));
        assert!(content.contains("\twarn\tio.rs:42\tfrom log\n"), "{content}");
    }

    #[test]
    fn test_tracing_bridge_collects_fields() {
        let dir = tempdir().unwrap();
        let (registry, path) = configured(&dir, Options::default().with_json_encoding(true));
        let subscriber = tracing_subscriber::registry().with(TracingBridge::new(&registry));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("hidden");
            tracing::info!(user = "ana", attempt = 2u64, "signed {}", "in");
        });
        registry.sync().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["msg"], "signed in");
        assert_eq!(parsed["user"], "ana");
        assert_eq!(parsed["attempt"], 2);
    }

    #[test]
    fn test_tracing_bridge_follows_runtime_level() {
        let dir = tempdir().unwrap();
        let (registry, path) = configured(&dir, Options::default());
        let subscriber = tracing_subscriber::registry().with(TracingBridge::new(&registry));

        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..2 {
                tracing::debug!("maybe");
                registry.default_logger().set_output_level(Level::Debug);
            }
        });
        registry.sync().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("\tdebug\tmaybe").count(), 1);
    }
}
