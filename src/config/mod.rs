//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`APIPROBE_API_KEY`, `APIPROBE_BASE_URL`,
//!    `APIPROBE_MODEL`, `APIPROBE_API_TIMEOUT_SECS`)
//! 2. TOML file specified via --config CLI flag
//! 3. ./apiprobe.toml in the current directory
//! 4. $XDG_CONFIG_HOME/apiprobe/apiprobe.toml (or the platform equivalent)
//! 5. Built-in defaults

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

mod defaults;
mod env;
mod types;

pub use types::{
    AgentConfig, ApiConfig, Config, ConfirmationConfig, DisplayConfig, LimitsConfig, ToolsConfig,
};

/// Where the active config text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` path.
    Explicit(PathBuf),
    /// `./apiprobe.toml`.
    Local,
    /// `<config_dir>/apiprobe/apiprobe.toml`.
    Global(PathBuf),
    /// No file found.
    BuiltInDefaults,
}

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from --config flag).
pub fn load_config(path_override: Option<&str>) -> Result<(Config, ConfigSource), ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        dirs::config_dir,
    )
}

fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<(Config, ConfigSource), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let (text, source) = read_config_text(path_override, &read_file, &config_root)?;
    let mut config: Config = toml::from_str(&text)?;
    env::resolve_api_key(&mut config, &env_lookup);
    env::apply_runtime_env_overrides(&mut config, &env_lookup)?;
    validate(&config)?;
    tracing::debug!(?source, model = %config.api.model, "configuration loaded");
    Ok((config, source))
}

/// Read config text from the highest-precedence available source.
fn read_config_text<FRead, FRoot>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: &FRoot,
) -> Result<(String, ConfigSource), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FRoot: Fn() -> Option<PathBuf>,
{
    // An explicit path must exist.
    if let Some(p) = path_override {
        let path = PathBuf::from(p);
        let text = read_file(&path)?;
        return Ok((text, ConfigSource::Explicit(path)));
    }

    if let Ok(text) = read_file(Path::new(defaults::CONFIG_FILE_NAME)) {
        return Ok((text, ConfigSource::Local));
    }
    if let Some(dir) = config_root() {
        let global = dir
            .join(defaults::CONFIG_DIR_NAME)
            .join(defaults::CONFIG_FILE_NAME);
        if let Ok(text) = read_file(&global) {
            return Ok((text, ConfigSource::Global(global)));
        }
    }

    // Nothing found; an empty document parses into defaults.
    Ok((String::new(), ConfigSource::BuiltInDefaults))
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must not be empty".into()));
    }
    if config.api.model.trim().is_empty() {
        return Err(ConfigError::Invalid("api.model must not be empty".into()));
    }
    if let Some(temperature) = config.api.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid(format!(
                "api.temperature must be between 0 and 2, got {temperature}"
            )));
        }
    }
    if config.confirmation.timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "confirmation.timeout_secs must be at least 1".into(),
        ));
    }
    Ok(())
}
