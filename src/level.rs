use crate::resolver::{EnvResolver, LevelResolver};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::Level;

/// Minimum severity a logger emits.
///
/// Ordered `Debug < Info < Warn < Error`. `tracing`'s `TRACE` has no
/// counterpart and sits below every threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    /// Severity of a `tracing` level, `None` for `TRACE`.
    pub fn of(level: &Level) -> Option<Severity> {
        match *level {
            Level::ERROR => Some(Severity::Error),
            Level::WARN => Some(Severity::Warn),
            Level::INFO => Some(Severity::Info),
            Level::DEBUG => Some(Severity::Debug),
            _ => None,
        }
    }

    fn from_u8(raw: u8) -> Severity {
        match raw {
            0 => Severity::Debug,
            1 => Severity::Info,
            2 => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not one of debug/info/warn/error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid level name: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        [Severity::Debug, Severity::Info, Severity::Warn, Severity::Error]
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseSeverityError(name.to_string()))
    }
}

/// Shared, atomically updated severity threshold of one logger.
///
/// Clones point at the same cell. The layer reads it on every event;
/// the [`LevelRegistry`](crate::registry::LevelRegistry) writes it.
#[derive(Clone, Debug)]
pub struct LevelHandle {
    level: Arc<AtomicU8>,
}

impl LevelHandle {
    pub fn new(level: Severity) -> Self {
        LevelHandle {
            level: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    pub fn get(&self) -> Severity {
        Severity::from_u8(self.level.load(Ordering::Acquire))
    }

    pub fn set(&self, level: Severity) {
        self.level.store(level as u8, Ordering::Release);
    }

    /// Store `level` and return the previous value.
    pub fn replace(&self, level: Severity) -> Severity {
        Severity::from_u8(self.level.swap(level as u8, Ordering::AcqRel))
    }

    /// Whether an event at `level` passes the current threshold.
    pub fn enabled(&self, level: &Level) -> bool {
        Severity::of(level).is_some_and(|severity| severity >= self.get())
    }

    /// True when both handles share the same cell.
    pub fn ptr_eq(&self, other: &LevelHandle) -> bool {
        Arc::ptr_eq(&self.level, &other.level)
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.level) as usize
    }
}

impl Default for LevelHandle {
    fn default() -> Self {
        LevelHandle::new(Severity::Info)
    }
}

/// Resolve `key` through `resolver` into a severity.
///
/// Returns `None` when the source is unset or empty. An unrecognized name
/// also yields `None` and emits a warning carrying the key and the value.
pub fn resolve_level(key: &str, resolver: &dyn LevelResolver) -> Option<Severity> {
    let name = resolver.resolve(key).filter(|name| !name.is_empty())?;
    match name.parse::<Severity>() {
        Ok(level) => Some(level),
        Err(_) => {
            tracing::warn!(key = %key, value = %name, "key is an invalid logging level name");
            None
        }
    }
}

/// Level named by `key` in `resolver`, or `default` when unset or invalid.
pub fn level_from_resolver(key: &str, resolver: &dyn LevelResolver, default: Severity) -> Severity {
    resolve_level(key, resolver).unwrap_or(default)
}

/// Level named by the environment variable `key`, or `default`.
pub fn level_from_env(key: &str, default: Severity) -> Severity {
    level_from_resolver(key, &EnvResolver, default)
}
