use crate::config::LoggerConfig;
use crate::layer::ContextLayer;
use crate::level::LevelHandle;
use crate::registry::{LevelRegistry, RegistryError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Error returned when installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to install global subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("failed to register log level source: {0}")]
    Registry(#[from] RegistryError),
}

fn install(layer: ContextLayer) -> Result<(), InitError> {
    let subscriber = Registry::default().with(layer);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Install a [`ContextLayer`] built from `config` as the global default
/// subscriber.
///
/// **Returns**
/// - the [`LevelHandle`] of the installed layer.
/// - `Err(InitError::SetGlobal)` if a global subscriber already exists.
pub fn init_with_config(config: LoggerConfig) -> Result<LevelHandle, InitError> {
    let (layer, handle) = config.build();
    install(layer)?;
    Ok(handle)
}

/// Like [`init_with_config`], and register the level source with
/// `registry` so that [`LevelRegistry::refresh`] keeps it current.
pub fn init_managed(config: LoggerConfig, registry: &LevelRegistry) -> Result<LevelHandle, InitError> {
    let (layer, handle) = config.build_managed(registry)?;
    install(layer)?;
    Ok(handle)
}

/// Initialize logging from the environment.
///
/// Equivalent to [`init_managed`] with [`LoggerConfig::from_env`] and
/// [`LevelRegistry::global`]: after changing `LOG_LEVEL`, a call to
/// `LevelRegistry::global().refresh()` applies it.
pub fn init() -> Result<LevelHandle, InitError> {
    init_managed(LoggerConfig::from_env(), LevelRegistry::global())
}
