use crate::level::{resolve_level, LevelHandle};
use crate::resolver::{EnvResolver, LevelResolver};
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Error returned when a [`LevelSource`] is incomplete.
///
/// Checked in field order; the first missing piece is reported.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handle is required")]
    MissingHandle,

    #[error("key is required")]
    MissingKey,

    #[error("resolver is required")]
    MissingResolver,
}

/// Binding between a [`LevelHandle`] and the place its level comes from.
#[derive(Clone, Default)]
pub struct LevelSource {
    pub handle: Option<LevelHandle>,
    /// Key handed to `resolver`, e.g. an environment variable name.
    pub key: String,
    pub resolver: Option<Arc<dyn LevelResolver>>,
}

impl LevelSource {
    /// Source reading the environment variable `key`.
    pub fn env(handle: &LevelHandle, key: impl Into<String>) -> Self {
        LevelSource {
            handle: Some(handle.clone()),
            key: key.into(),
            resolver: Some(Arc::new(EnvResolver)),
        }
    }
}

#[derive(Clone)]
struct Registration {
    handle: LevelHandle,
    key: String,
    resolver: Arc<dyn LevelResolver>,
}

impl Registration {
    fn apply(&self) {
        let Some(level) = resolve_level(&self.key, self.resolver.as_ref()) else {
            return;
        };
        let previous = self.handle.replace(level);
        if previous != level {
            tracing::debug!(key = %self.key, from = %previous, to = %level, "log level changed");
        }
    }
}

/// Process-scoped association of level handles to their sources.
///
/// Entries are keyed by handle identity; registering the same handle again
/// replaces its source. Clones share state, so a registry can be built once
/// and handed to every component that owns a logger. [`LevelRegistry::global`]
/// gives a shared instance for code that has no such wiring.
#[derive(Clone, Default)]
pub struct LevelRegistry {
    entries: Arc<DashMap<usize, Registration>>,
}

static GLOBAL: OnceLock<LevelRegistry> = OnceLock::new();

impl LevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry. Every call returns the same instance.
    pub fn global() -> &'static LevelRegistry {
        GLOBAL.get_or_init(LevelRegistry::new)
    }

    /// Store `source`, replacing any earlier binding for the same handle.
    ///
    /// **Errors**
    /// - [`RegistryError::MissingHandle`] when `source.handle` is `None`.
    /// - [`RegistryError::MissingKey`] when `source.key` is empty.
    /// - [`RegistryError::MissingResolver`] when `source.resolver` is `None`.
    ///
    /// Nothing is stored on error.
    pub fn register(&self, source: LevelSource) -> Result<(), RegistryError> {
        let handle = source.handle.ok_or(RegistryError::MissingHandle)?;
        if source.key.is_empty() {
            return Err(RegistryError::MissingKey);
        }
        let resolver = source.resolver.ok_or(RegistryError::MissingResolver)?;

        self.entries.insert(
            handle.id(),
            Registration {
                handle,
                key: source.key,
                resolver,
            },
        );
        Ok(())
    }

    /// Register `handle` against the environment variable `key`.
    pub fn register_env(&self, handle: &LevelHandle, key: impl Into<String>) -> Result<(), RegistryError> {
        self.register(LevelSource::env(handle, key))
    }

    /// Register `handle` against `key` looked up through `resolver`.
    pub fn register_with<R>(&self, handle: &LevelHandle, key: impl Into<String>, resolver: R) -> Result<(), RegistryError>
    where
        R: LevelResolver + 'static,
    {
        self.register(LevelSource {
            handle: Some(handle.clone()),
            key: key.into(),
            resolver: Some(Arc::new(resolver)),
        })
    }

    /// Re-read every source and update its handle.
    ///
    /// Unset sources leave the handle at its current level. Unrecognized
    /// names emit a warning and also leave it untouched. Calling this twice
    /// with unchanged sources changes nothing the second time.
    pub fn refresh(&self) {
        // Resolvers run outside the map's shard locks.
        let snapshot: Vec<Registration> = self.entries.iter().map(|entry| entry.value().clone()).collect();
        for registration in &snapshot {
            registration.apply();
        }
    }

    /// Spawn a Tokio task that calls [`refresh`](Self::refresh) every `period`.
    ///
    /// Periods under 10ms are raised to 10ms. Abort the returned handle to
    /// stop refreshing.
    pub fn spawn_refresh(&self, period: Duration) -> JoinHandle<()> {
        let period = period.max(Duration::from_millis(10));
        let registry = self.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                registry.refresh();
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_registered(&self, handle: &LevelHandle) -> bool {
        self.entries.contains_key(&handle.id())
    }

    /// Lookup key currently bound to `handle`.
    pub fn key_for(&self, handle: &LevelHandle) -> Option<String> {
        self.entries.get(&handle.id()).map(|entry| entry.key.clone())
    }
}
