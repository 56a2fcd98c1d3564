//! Error types shared by the polling pipeline.
//!
//! The `Display` text of every variant is what ends up in the chat when a cycle
//! fails, so it is written for the person reading the notification.

use thiserror::Error;

/// Coarse classification used by the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid startup configuration. Fatal.
    Config,
    /// Network-level failure while talking to the status API.
    Transport,
    /// The API answered, but not with what we expected.
    Protocol,
}

/// Errors produced while loading configuration or running a poll cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BotError {
    /// One or more required environment variables are absent or empty
    #[error("Отсутствуют обязательные переменные окружения: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
    /// Chat identifier is neither numeric nor an `@channel` name
    #[error("Некорректный идентификатор чата: {0}")]
    InvalidChatId(String),
    /// Configuration source could not be read or deserialized
    #[error("Ошибка загрузки конфигурации: {0}")]
    Settings(String),
    /// Connection, DNS, TLS or timeout failure
    #[error("Ошибка запроса: {0}")]
    Request(String),
    /// The endpoint answered with a non-200 status
    #[error("Эндпоинт недоступен. Код ответа: {0}")]
    UnexpectedStatus(u16),
    /// Body of a 200 response is not JSON
    #[error("Ответ API не является корректным JSON: {0}")]
    InvalidJson(String),
    #[error("Ответ API не является словарем")]
    NotAMapping,
    #[error("В ответе API отсутствует ключ \"homeworks\"")]
    MissingHomeworks,
    #[error("Домашние работы должны быть в формате списка")]
    HomeworksNotAList,
    /// Homework record lacks a required key
    #[error("Отсутствует ключ \"{0}\" в домашней работе")]
    MissingKey(&'static str),
    /// Status outside of the known verdict vocabulary
    #[error("Неожиданный статус домашней работы: {0}")]
    UnknownStatus(String),
}

impl BotError {
    /// Classify the error for the loop boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials(_) | Self::InvalidChatId(_) | Self::Settings(_) => {
                ErrorKind::Config
            }
            Self::Request(_) => ErrorKind::Transport,
            Self::UnexpectedStatus(_)
            | Self::InvalidJson(_)
            | Self::NotAMapping
            | Self::MissingHomeworks
            | Self::HomeworksNotAList
            | Self::MissingKey(_)
            | Self::UnknownStatus(_) => ErrorKind::Protocol,
        }
    }

    /// Whether the process cannot continue after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_lists_every_variable() {
        let err = BotError::MissingCredentials(vec!["PRACTICUM_TOKEN", "TELEGRAM_CHAT_ID"]);
        assert_eq!(
            err.to_string(),
            "Отсутствуют обязательные переменные окружения: PRACTICUM_TOKEN, TELEGRAM_CHAT_ID"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert_eq!(BotError::Request("timeout".into()).kind(), ErrorKind::Transport);
        assert_eq!(BotError::UnexpectedStatus(503).kind(), ErrorKind::Protocol);
        assert_eq!(BotError::MissingKey("status").kind(), ErrorKind::Protocol);
        assert!(!BotError::UnknownStatus("archived".into()).is_fatal());
        assert!(BotError::InvalidChatId("abc".into()).is_fatal());
    }

    #[test]
    fn test_status_code_text() {
        assert_eq!(
            BotError::UnexpectedStatus(404).to_string(),
            "Эндпоинт недоступен. Код ответа: 404"
        );
    }
}
