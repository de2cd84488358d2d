use serde::{Deserialize, Serialize};

use std::{env, fs, path::Path, path::PathBuf};

use crate::view::AdminMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
    /// URL the page is opened at. A `#admin` fragment enables delete controls.
    pub page_url: String,
    /// chrono format string used for the display date of new notes.
    pub date_format: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            database_path: PathBuf::from("notes.db"),
            page_url: "http://localhost:8000/".to_string(),
            date_format: "%-d/%-m/%Y, %H:%M:%S".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn admin_mode(&self) -> AdminMode {
        AdminMode::from_url(&self.page_url)
    }
}

fn parse_from_file(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(Into::into)
}

/// Builds a config from `NOTES_*` variables, keeping defaults for unset ones.
fn load_from_env() -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::default();

    if let Ok(port) = env::var("NOTES_PORT") {
        config.port = port
            .parse::<u16>()
            .map_err(|e| format!("Failed to parse NOTES_PORT: {e}"))?;
    }
    if let Ok(path) = env::var("NOTES_DATABASE_PATH") {
        config.database_path = PathBuf::from(path);
    }
    if let Ok(url) = env::var("NOTES_PAGE_URL") {
        config.page_url = url;
    }
    if let Ok(format) = env::var("NOTES_DATE_FORMAT") {
        config.date_format = format;
    }
    if let Ok(level) = env::var("NOTES_LOG_LEVEL") {
        config.log_level = level;
    }

    Ok(config)
}

/// Where the loaded configuration came from.
///
/// `load_config` runs before the log subscriber exists, so it reports the
/// source instead of logging it; call [`ConfigSource::log`] once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    Fallback { requested: String, used: String },
    Env,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::info!("Loaded config from '{}'", path),
            Self::Fallback { requested, used } => tracing::warn!(
                "Config file '{}' not found, falling back to '{}'",
                requested,
                used
            ),
            Self::Env => tracing::info!(
                "No config file found, loaded configuration from environment variables"
            ),
        }
    }
}

/// Parses the first existing file among `requested` and `fallbacks`.
/// Returns `None` when none of them exists.
fn load_from_files(
    requested: &str,
    fallbacks: &[&str],
) -> Option<Result<(Config, ConfigSource), Box<dyn std::error::Error>>> {
    if Path::new(requested).exists() {
        let source = ConfigSource::File(requested.to_string());
        return Some(parse_from_file(requested).map(|config| (config, source)));
    }

    let used = fallbacks.iter().find(|path| Path::new(path).exists())?;
    let source = ConfigSource::Fallback {
        requested: requested.to_string(),
        used: (*used).to_string(),
    };
    Some(parse_from_file(used).map(|config| (config, source)))
}

pub fn load_config() -> Result<(Config, ConfigSource), Box<dyn std::error::Error>> {
    // Retrieve env variable
    let config_path = env::var("NOTES_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    // Try env path, then config.yaml, then config.example.yaml
    if let Some(loaded) = load_from_files(&config_path, &["config.yaml", "config.example.yaml"]) {
        return loaded;
    }

    // Fallback to environment variables
    load_from_env().map(|config| (config, ConfigSource::Env))
}
