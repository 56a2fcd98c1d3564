//! Delivery of notifications to the configured Telegram chat.
//!
//! Delivery never fails loudly: callers get a `bool` and decide what a missed
//! message means for them.
//!
//! # Usage
//!
//! ```ignore
//! use homework_status_bot::notifier::{Notifier, TelegramNotifier};
//!
//! let notifier = TelegramNotifier::new(Bot::new(token), chat_id);
//! if !notifier.send("Бот запущен и начал мониторинг").await {
//!     // nothing was delivered, keep the cursor where it is
//! }
//! ```

use async_trait::async_trait;
use std::borrow::Cow;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, error, info};

/// Longest text sent in one message, in characters.
/// Telegram's limit is 4096; the rest is left for the truncation notice.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

const TRUNCATION_NOTICE: &str = "...\n\n(сообщение обрезано)";

/// Cut `text` to [`TELEGRAM_MESSAGE_LIMIT`] characters, marking the cut.
#[must_use]
pub fn truncate_message(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(TELEGRAM_MESSAGE_LIMIT) {
        Some((end, _)) => Cow::Owned(format!("{}{TRUNCATION_NOTICE}", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

/// Interface for notification channels
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the chat.
    ///
    /// Returns `true` only when delivery was confirmed. Errors are logged
    /// and never propagated.
    async fn send(&self, text: &str) -> bool;
}

/// Sends plain text messages through the Telegram Bot API
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: Recipient,
}

impl TelegramNotifier {
    /// Create a notifier bound to a single chat
    #[must_use]
    pub const fn new(bot: Bot, chat_id: Recipient) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> bool {
        info!("Sending message: {text}");
        let text = truncate_message(text);
        match self.bot.send_message(self.chat_id.clone(), &*text).await {
            Ok(_) => {
                debug!("Bot sent message: \"{text}\"");
                true
            }
            Err(e) => {
                error!("Failed to send message: {e}");
                false
            }
        }
    }
}
