//! API connection config: token, API base URL and HTTP timeout.
//! Loaded from BOT_TOKEN, TELEGRAM_API_URL and TELEGRAM_REQUEST_TIMEOUT_SECS.

use anyhow::Result;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bot_token: String,
    /// Base URL without trailing slash; requests go to `{api_url}/bot{token}/{method}`.
    pub api_url: String,
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Loads from the environment. `token` overrides BOT_TOKEN when given.
    pub fn from_env(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let api_url = env::var("TELEGRAM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let request_timeout_secs: u64 = match env::var("TELEGRAM_REQUEST_TIMEOUT_SECS") {
            Ok(value) => value.trim().parse().map_err(|e| {
                anyhow::anyhow!("TELEGRAM_REQUEST_TIMEOUT_SECS must be a non-negative integer: {e}")
            })?,
            Err(_) => 60,
        };

        let config = Self {
            bot_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(request_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// Default URL and timeout with the given token.
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if reqwest::Url::parse(&self.api_url).is_err() {
            anyhow::bail!("TELEGRAM_API_URL is not a valid URL: {}", self.api_url);
        }
        Ok(())
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }

    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, self.bot_token, file_path)
    }
}

/// Masks a token for logging: first 7 chars + "***" + last 4 chars, or "***" when short.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        "***".to_string()
    } else {
        format!("{}***{}", &token[..7], &token[len - 4..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_with_token() {
        let config = ApiConfig::with_token("123:abc");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.method_url("getMe"), "https://api.telegram.org/bot123:abc/getMe");
        assert_eq!(
            config.file_url("photos/file_1.jpg"),
            "https://api.telegram.org/file/bot123:abc/photos/file_1.jpg"
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ApiConfig::with_token("t").with_api_url("http://localhost:8081/");
        assert_eq!(config.method_url("getMe"), "http://localhost:8081/bott/getMe");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        env::set_var("BOT_TOKEN", "env_token");
        env::remove_var("TELEGRAM_API_URL");
        env::remove_var("TELEGRAM_REQUEST_TIMEOUT_SECS");

        let config = ApiConfig::from_env(None).unwrap();
        assert_eq!(config.bot_token, "env_token");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    #[serial]
    fn test_from_env_token_override_and_invalid_url() {
        env::set_var("BOT_TOKEN", "env_token");
        env::set_var("TELEGRAM_API_URL", "not a url");

        assert!(ApiConfig::from_env(Some("cli_token".to_string())).is_err());

        env::set_var("TELEGRAM_API_URL", "http://127.0.0.1:9000");
        let config = ApiConfig::from_env(Some("cli_token".to_string())).unwrap();
        assert_eq!(config.bot_token, "cli_token");
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        env::remove_var("TELEGRAM_API_URL");
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_timeout() {
        env::set_var("BOT_TOKEN", "env_token");
        env::remove_var("TELEGRAM_API_URL");
        env::set_var("TELEGRAM_REQUEST_TIMEOUT_SECS", "a minute");
        assert!(ApiConfig::from_env(None).is_err());

        env::set_var("TELEGRAM_REQUEST_TIMEOUT_SECS", "90");
        let config = ApiConfig::from_env(None).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(90));
        env::remove_var("TELEGRAM_REQUEST_TIMEOUT_SECS");
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token() {
        env::remove_var("BOT_TOKEN");
        assert!(ApiConfig::from_env(None).is_err());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("123456789:ABCDEFGHIJ"), "1234567***GHIJ");
    }
}
