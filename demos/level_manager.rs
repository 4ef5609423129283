use tracing::{debug, error, info, warn};
use tracing_contextual::{Format, LevelRegistry, LoggerConfig, Severity};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;

// Set these to debug/info/warn/error to change each logger's level.
const LOGGER1_LEVEL_ENV: &str = "LOGGER1_LOG_LEVEL";
const LOGGER2_LEVEL_ENV: &str = "LOGGER2_LOG_LEVEL";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = LevelRegistry::new();

    let (logger1, level1) = LoggerConfig {
        format: Format::Json,
        writer: BoxMakeWriter::new(std::io::stdout),
        level: Severity::Info,
        target: Some("logger1".to_string()),
        ..LoggerConfig::default()
    }
    .build();
    let (logger2, level2) = LoggerConfig {
        format: Format::Json,
        writer: BoxMakeWriter::new(std::io::stdout),
        level: Severity::Debug,
        target: Some("logger2".to_string()),
        ..LoggerConfig::default()
    }
    .build();

    registry.register_env(&level1, LOGGER1_LEVEL_ENV)?;
    registry.register_env(&level2, LOGGER2_LEVEL_ENV)?;
    registry.refresh();

    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(logger1).with(logger2))?;

    info!(target: "logger1", threshold = %level1.get(), "logger initialized");
    info!(target: "logger2", threshold = %level2.get(), "logger initialized");

    // Hidden unless LOGGER1_LOG_LEVEL=debug.
    debug!(target: "logger1", "logger1 debug message");
    info!(target: "logger1", "logger1 info message");
    warn!(target: "logger1", "logger1 warn message");
    error!(target: "logger1", "logger1 error message");

    // Shown unless LOGGER2_LOG_LEVEL raises the threshold.
    debug!(target: "logger2", "logger2 debug message");
    info!(target: "logger2", "logger2 info message");
    error!(target: "logger2", "logger2 error message");

    Ok(())
}
