use crate::context::LogContext;
use crate::format::Format;
use crate::level::LevelHandle;
use crate::record::LogRecord;
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// `tracing_subscriber` layer that filters events by a [`LevelHandle`],
/// decorates them with the current [`LogContext`] and writes them out.
///
/// The threshold is re-read on every event, so changes made through the
/// handle (directly or by a [`LevelRegistry`](crate::registry::LevelRegistry)
/// refresh) apply to the next event without rebuilding the subscriber.
pub struct ContextLayer {
    writer: BoxMakeWriter,
    format: Format,
    handle: LevelHandle,
    context_aware: bool,
    target: Option<String>,
}

impl ContextLayer {
    /// Create a layer writing `format` records to `writer`.
    ///
    /// **Parameters**
    /// - `handle`: threshold shared with whoever adjusts the level.
    /// - `context_aware`: attach attributes of [`LogContext::current`].
    /// - `target`: when set, only events whose target starts with it are
    ///   written.
    pub fn new(
        writer: BoxMakeWriter,
        format: Format,
        handle: LevelHandle,
        context_aware: bool,
        target: Option<String>,
    ) -> Self {
        Self {
            writer,
            format,
            handle,
            context_aware,
            target,
        }
    }

    pub fn handle(&self) -> &LevelHandle {
        &self.handle
    }

    /// Events from this crate (e.g. invalid level names found on refresh)
    /// pass every target filter.
    fn accepts_target(&self, target: &str) -> bool {
        target.starts_with(OWN_TARGET)
            || self
                .target
                .as_deref()
                .map_or(true, |prefix| target.starts_with(prefix))
    }
}

impl<S> Layer<S> for ContextLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !self.handle.enabled(meta.level()) || !self.accepts_target(meta.target()) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        if self.context_aware {
            for (key, value) in LogContext::current().iter() {
                fields.insert(key.to_string(), value.to_json());
            }
        }

        // Event fields are recorded last so they win over context attributes.
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let record = LogRecord {
            timestamp: Utc::now(),
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message,
            fields,
        };

        let line = self.format.render(&record);
        let mut writer = self.writer.make_writer_for(meta);
        if let Err(e) = writer.write_all(line.as_bytes()) {
            eprintln!("failed to write log record: {}", e);
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
