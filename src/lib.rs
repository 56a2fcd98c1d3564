//! Homework status bot.
//!
//! Polls the Practicum homework status API and relays review verdicts to a
//! Telegram chat.

pub mod api;
pub mod config;
pub mod error;
pub mod homework;
pub mod logging;
pub mod notifier;
pub mod poller;

pub use error::{BotError, ErrorKind};
