use crate::config::{LogConfig, LogFormat, LogOutput};
use crate::{Result, ScoutError};
use std::str::FromStr;
use tracing::{warn, Level};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured level when set.
pub fn init(config: &LogConfig, verbose: bool) -> Result<()> {
    let configured = parse_level(&config.level);
    let level = if verbose {
        Level::DEBUG
    } else {
        configured.unwrap_or(Level::INFO)
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let writer = match config.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|e| ScoutError::ConfigError(format!("Failed to set up logging: {}", e)))?;

    if configured.is_none() {
        warn!(level = %config.level, "Invalid log level, using info");
    }

    Ok(())
}

pub fn parse_level(level: &str) -> Option<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(Level::WARN),
        other => Level::from_str(other).ok(),
    }
}
