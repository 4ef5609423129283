use dashmap::DashMap;
use std::sync::Arc;

/// Source of level names, looked up by key.
///
/// Implementations must not block: the registry calls them synchronously
/// during [`refresh`](crate::registry::LevelRegistry::refresh). Returning
/// `None` (or an empty string) means "not set".
pub trait LevelResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}

impl<F> LevelResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn resolve(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Reads level names from process environment variables.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvResolver;

impl LevelResolver for EnvResolver {
    fn resolve(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|value| !value.is_empty())
    }
}

/// In-memory key/value source.
///
/// Clones share the same map, so a test or a config-service poller can
/// hold one clone and update values the registry later reads.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    values: Arc<DashMap<String, String>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn unset(&self, key: &str) {
        self.values.remove(key);
    }
}

impl<K, V> FromIterator<(K, V)> for StaticResolver
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let resolver = StaticResolver::new();
        for (key, value) in iter {
            resolver.set(key, value);
        }
        resolver
    }
}

impl LevelResolver for StaticResolver {
    fn resolve(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|value| value.value().clone())
    }
}
