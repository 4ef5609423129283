use crate::env::{env_or, LOG_CONTEXT_ENV, LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use crate::format::Format;
use crate::layer::ContextLayer;
use crate::level::{level_from_resolver, LevelHandle, Severity};
use crate::registry::{LevelRegistry, LevelSource, RegistryError};
use crate::resolver::{EnvResolver, LevelResolver};
use std::fmt;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Settings for one logger, i.e. one [`ContextLayer`] and its
/// [`LevelHandle`].
///
/// **Fields**
/// - `format`: text or JSON output.
/// - `writer`: destination of rendered records.
/// - `level`: initial threshold.
/// - `context_aware`: attach [`LogContext`](crate::context::LogContext)
///   attributes to records.
/// - `level_key`: when set, the initial threshold is read from this key,
///   falling back to `level`.
/// - `level_resolver`: where `level_key` is looked up; the environment
///   when `None`.
/// - `target`: only events whose target starts with this prefix are
///   written, so several loggers can share one subscriber.
pub struct LoggerConfig {
    pub format: Format,
    pub writer: BoxMakeWriter,
    pub level: Severity,
    pub context_aware: bool,
    pub level_key: Option<String>,
    pub level_resolver: Option<Arc<dyn LevelResolver>>,
    pub target: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: Format::Text,
            writer: BoxMakeWriter::new(std::io::stderr),
            level: Severity::Info,
            context_aware: false,
            level_key: None,
            level_resolver: None,
            target: None,
        }
    }
}

impl fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("context_aware", &self.context_aware)
            .field("level_key", &self.level_key)
            .field("custom_resolver", &self.level_resolver.is_some())
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl LoggerConfig {
    /// Default config adjusted by `LOG_FORMAT` and `LOG_CONTEXT`, with the
    /// level taken from `LOG_LEVEL`.
    ///
    /// An unknown `LOG_FORMAT` keeps the text format.
    pub fn from_env() -> Self {
        let format = env_or(LOG_FORMAT_ENV, "text").parse().unwrap_or_default();
        let context_aware = env_or(LOG_CONTEXT_ENV, "false").eq_ignore_ascii_case("true");

        Self {
            format,
            context_aware,
            level_key: Some(LOG_LEVEL_ENV.to_string()),
            ..Self::default()
        }
    }

    /// Build the layer and the handle controlling its threshold.
    pub fn build(self) -> (ContextLayer, LevelHandle) {
        let (layer, handle, _source) = self.into_parts();
        (layer, handle)
    }

    /// Like [`build`](Self::build), and register the handle with
    /// `registry` when `level_key` is set so later refreshes track it.
    pub fn build_managed(self, registry: &LevelRegistry) -> Result<(ContextLayer, LevelHandle), RegistryError> {
        let (layer, handle, source) = self.into_parts();
        if let Some(source) = source {
            registry.register(source)?;
        }
        Ok((layer, handle))
    }

    fn into_parts(self) -> (ContextLayer, LevelHandle, Option<LevelSource>) {
        let handle = LevelHandle::new(self.level);

        let source = self.level_key.filter(|key| !key.is_empty()).map(|key| {
            let resolver = self
                .level_resolver
                .unwrap_or_else(|| Arc::new(EnvResolver) as Arc<dyn LevelResolver>);
            handle.set(level_from_resolver(&key, resolver.as_ref(), self.level));
            LevelSource {
                handle: Some(handle.clone()),
                key,
                resolver: Some(resolver),
            }
        });

        let layer = ContextLayer::new(self.writer, self.format, handle.clone(), self.context_aware, self.target);
        (layer, handle, source)
    }
}
