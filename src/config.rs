//! Configuration and settings management
//!
//! Loads settings from environment variables (and optional config files) and
//! defines the polling constants.

use crate::error::BotError;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use teloxide::types::{ChatId, Recipient};

/// Homework statuses endpoint of the Practicum API.
pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Seconds between the end of one cycle and the start of the next.
pub const DEFAULT_RETRY_PERIOD_SECS: u64 = 600;

/// How far back the first query window reaches.
pub const LAST_MONTH_SECS: i64 = 30 * 24 * 60 * 60;

/// Text sent to the chat once monitoring starts.
pub const STARTUP_MESSAGE: &str = "Бот запущен и начал мониторинг";

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Practicum API `OAuth` token
    pub practicum_token: Option<String>,
    /// Telegram Bot API token
    pub telegram_token: Option<String>,
    /// Chat that receives notifications (numeric id or `@channel`)
    pub telegram_chat_id: Option<String>,

    /// Status API endpoint
    #[serde(default = "default_endpoint")]
    pub practicum_endpoint: String,
    /// Pause between cycles
    #[serde(default = "default_retry_period_secs")]
    pub retry_period_secs: u64,
    /// Optional HTTP timeout; the client default applies when unset
    pub request_timeout_secs: Option<u64>,
    /// Directory for the rotated log file
    pub log_dir: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

const fn default_retry_period_secs() -> u64 {
    DEFAULT_RETRY_PERIOD_SECS
}

/// Validated secrets the bot cannot run without.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Practicum API token
    pub practicum_token: String,
    /// Telegram Bot API token
    pub telegram_token: String,
    /// Resolved notification target
    pub chat_id: Recipient,
}

impl Settings {
    /// Create new settings by loading from config files and the environment.
    ///
    /// Missing credentials are not an error here; see [`Settings::credentials`].
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a source cannot be read or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Not checked into git
            .add_source(File::with_name("config/local").required(false))
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?
            .try_deserialize()
    }

    /// Check that all three secrets are present and resolve the chat id.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::MissingCredentials`] naming every absent variable,
    /// or [`BotError::InvalidChatId`] when the chat id cannot be resolved.
    pub fn credentials(&self) -> Result<Credentials, BotError> {
        let required = [
            ("PRACTICUM_TOKEN", &self.practicum_token),
            ("TELEGRAM_TOKEN", &self.telegram_token),
            ("TELEGRAM_CHAT_ID", &self.telegram_chat_id),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(BotError::MissingCredentials(missing));
        }

        Ok(Credentials {
            practicum_token: self.practicum_token.clone().unwrap_or_default(),
            telegram_token: self.telegram_token.clone().unwrap_or_default(),
            chat_id: parse_recipient(self.telegram_chat_id.as_deref().unwrap_or_default())?,
        })
    }

    /// Pause between cycles.
    #[must_use]
    pub const fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_period_secs)
    }

    /// Explicit HTTP timeout, if configured.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_recipient(raw: &str) -> Result<Recipient, BotError> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if raw.len() > 1 && raw.starts_with('@') {
        return Ok(Recipient::ChannelUsername(raw.to_string()));
    }
    Err(BotError::InvalidChatId(raw.to_string()))
}
