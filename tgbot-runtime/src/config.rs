//! Bot runtime config: API connection plus polling and logging settings.
//! Loaded from BOT_TOKEN, TELEGRAM_API_URL, TELEGRAM_REQUEST_TIMEOUT_SECS, BOT_COMMAND_SUFFIX,
//! POLL_TIMEOUT_SECS, POLL_ERROR_BACKOFF_MS and LOG_FILE.

use anyhow::Result;
use std::env;
use std::time::Duration;
use tgbot_api::ApiConfig;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub api: ApiConfig,
    /// Bot username accepted in `/command@username`.
    pub command_suffix: Option<String>,
    pub poll_timeout: Duration,
    pub error_backoff: Duration,
    pub log_file: Option<String>,
}

impl BotConfig {
    /// Loads from the environment; `token` overrides BOT_TOKEN.
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let api = ApiConfig::from_env(token)?;
        let command_suffix = env::var("BOT_COMMAND_SUFFIX")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let poll_timeout_secs = parse_var("POLL_TIMEOUT_SECS", 30)?;
        let error_backoff_ms = parse_var("POLL_ERROR_BACKOFF_MS", 1000)?;
        let log_file = env::var("LOG_FILE").ok();

        let config = Self {
            api,
            command_suffix,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
            error_backoff: Duration::from_millis(error_backoff_ms),
            log_file,
        };
        config.validate()?;
        Ok(config)
    }

    /// A long poll must end before the HTTP request times out.
    pub fn validate(&self) -> Result<()> {
        if self.poll_timeout >= self.api.request_timeout {
            anyhow::bail!(
                "POLL_TIMEOUT_SECS ({}s) must be less than TELEGRAM_REQUEST_TIMEOUT_SECS ({}s)",
                self.poll_timeout.as_secs(),
                self.api.request_timeout.as_secs()
            );
        }
        Ok(())
    }

    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self {
            api: ApiConfig::with_token(bot_token),
            command_suffix: None,
            poll_timeout: Duration::from_secs(30),
            error_backoff: Duration::from_millis(1000),
            log_file: None,
        }
    }
}

fn parse_var(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} must be a non-negative integer: {e}")),
        Err(_) => Ok(default),
    }
}
