//! Response validation and status message formatting.

use crate::error::BotError;
use serde_json::Value;

/// Review outcome reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Reviewing,
    Rejected,
}

impl Verdict {
    /// Parse the raw `status` value.
    #[must_use]
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "approved" => Some(Self::Approved),
            "reviewing" => Some(Self::Reviewing),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Canonical human-readable text for the verdict.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }
}

/// Check the decoded API payload and return its homework records.
///
/// Only the envelope is validated; individual records are checked by
/// [`parse_status`].
///
/// # Errors
///
/// Returns a protocol error if the payload is not an object, has no
/// `homeworks` key, or `homeworks` is not an array.
pub fn check_response(response: &Value) -> Result<&[Value], BotError> {
    let map = response.as_object().ok_or(BotError::NotAMapping)?;
    let homeworks = map.get("homeworks").ok_or(BotError::MissingHomeworks)?;
    homeworks
        .as_array()
        .map(Vec::as_slice)
        .ok_or(BotError::HomeworksNotAList)
}

/// Build the chat message for a single homework record.
///
/// # Errors
///
/// Returns [`BotError::MissingKey`] if `status` or `homework_name` is absent
/// and [`BotError::UnknownStatus`] for a status outside the verdict set.
pub fn parse_status(homework: &Value) -> Result<String, BotError> {
    let status = homework.get("status").ok_or(BotError::MissingKey("status"))?;
    let homework_name = homework
        .get("homework_name")
        .ok_or(BotError::MissingKey("homework_name"))?;

    let verdict = status
        .as_str()
        .and_then(Verdict::from_status)
        .ok_or_else(|| BotError::UnknownStatus(display_value(status)))?;

    Ok(format!(
        "Изменился статус проверки работы \"{}\". {}",
        display_value(homework_name),
        verdict.text()
    ))
}

/// Strings without their JSON quotes, anything else as JSON text.
fn display_value(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), ToString::to_string)
}
