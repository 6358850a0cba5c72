//! Default configuration constants.
//!
//! Callers share these constants instead of duplicating literals.

/// Default OpenAI-compatible API base URL.
pub(super) const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
/// Default model ID.
pub(super) const DEFAULT_MODEL_ID: &str = "gpt-4o-mini";
/// Default timeout for model API requests.
pub(super) const DEFAULT_API_TIMEOUT_SECS: u64 = 120;
/// Default extra attempts after a transient model API failure.
pub(super) const DEFAULT_API_MAX_RETRIES: u32 = 2;
/// Default timeout for `http_request` tool calls.
pub(super) const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Default cap on retained history messages (0 = unlimited).
pub(super) const DEFAULT_MAX_HISTORY: usize = 100;
/// Default wait for a human decision on a file write.
pub(super) const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 300;
/// Config file name looked up locally and under the user config dir.
pub(super) const CONFIG_FILE_NAME: &str = "apiprobe.toml";
/// Directory name under the user config dir.
pub(super) const CONFIG_DIR_NAME: &str = "apiprobe";
