pub mod context;
pub mod level;
pub mod registry;
pub mod resolver;

pub mod config;
pub mod env;
pub mod format;
pub mod init;
pub mod layer;
pub mod record;

#[cfg(test)]
mod test_support;

pub use context::{Attr, AttrValue, ContextGuard, FutureExt, LogContext, WithLogContext};
pub use config::LoggerConfig;
pub use format::Format;
pub use layer::ContextLayer;
pub use level::{LevelHandle, Severity};
pub use registry::{LevelRegistry, LevelSource, RegistryError};
pub use resolver::{EnvResolver, LevelResolver, StaticResolver};
