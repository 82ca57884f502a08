//! Configuration loading for the CLI
//!
//! Layers an optional TOML file and environment variables over the
//! library defaults.

use config::{Config, Environment, File};
use serde::Deserialize;
use speechkit::{EncoderConfig, SpeechKitConfig};

/// CLI settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Speech API client settings
    #[serde(default)]
    pub client: SpeechKitConfig,
    /// Opus encoder settings
    #[serde(default)]
    pub encoder: EncoderConfig,
}

/// Load settings from the given file (optional) and the environment
///
/// Environment variables use the `SPEECHKIT` prefix with `__` as the
/// nesting separator, e.g. `SPEECHKIT_CLIENT__FOLDER_ID`. A single `_`
/// would split the snake_case field names themselves.
pub fn load(config_file: &str) -> anyhow::Result<Settings> {
    let settings = Config::builder()
        .add_source(File::with_name(config_file).required(false))
        .add_source(
            Environment::with_prefix("SPEECHKIT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
