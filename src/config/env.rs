//! Environment variable overrides.
//!
//! `APIPROBE_*` variables win over every file source.

use crate::error::ConfigError;

use super::Config;

pub(super) const ENV_API_KEY: &str = "APIPROBE_API_KEY";
pub(super) const ENV_BASE_URL: &str = "APIPROBE_BASE_URL";
pub(super) const ENV_MODEL: &str = "APIPROBE_MODEL";
pub(super) const ENV_API_TIMEOUT_SECS: &str = "APIPROBE_API_TIMEOUT_SECS";

/// Resolve the API key: env override, then the file's literal key, then the
/// variable named by `api_key_env`.
pub(super) fn resolve_api_key<FEnv>(config: &mut Config, env_lookup: &FEnv)
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(key) = non_empty(env_lookup(ENV_API_KEY)) {
        config.api.api_key = key;
        return;
    }
    if !config.api.api_key.trim().is_empty() {
        return;
    }
    if let Some(name) = config.api.api_key_env.as_deref() {
        if let Some(key) = non_empty(env_lookup(name)) {
            config.api.api_key = key;
        }
    }
}

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_empty(env_lookup(ENV_BASE_URL)) {
        config.api.base_url = url;
    }
    if let Some(model) = non_empty(env_lookup(ENV_MODEL)) {
        config.api.model = model;
    }
    if let Some(timeout) = env_lookup(ENV_API_TIMEOUT_SECS) {
        let parsed = timeout.trim().parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid {ENV_API_TIMEOUT_SECS} value `{timeout}`: expected positive integer seconds"
            ))
        })?;
        // Clamp to at least 1 second to avoid accidental "no timeout".
        config.api.timeout_secs = parsed.max(1);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
