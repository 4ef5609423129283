//! Environment variable names read by [`LoggerConfig::from_env`](crate::config::LoggerConfig::from_env).
//!
//! These are helpers only; the registry and the layer never read the
//! environment on their own.

/// Level name for the default logger (`debug`, `info`, `warn`, `error`).
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Output format, `text` or `json`.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// `true` to attach the current context's attributes to every record.
pub const LOG_CONTEXT_ENV: &str = "LOG_CONTEXT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
