//! Conversion of `PT[nH][nM]` duration strings into whole minutes.
//!
//! The default parser is positional: hour digits are whatever sits between
//! character 2 and the first `H`, minute digits whatever sits between that
//! `H` (or character 2) and the first `M`. Positions count characters, not
//! bytes. It does not check the `PT` prefix or the
//! order of the designators, so off-shape input either fails or yields a
//! number that is only as meaningful as the input. [`parse_duration_strict`]
//! is the alternative that validates the whole string.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

const DIGITS_START: usize = 2;

static STRICT_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("duration pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("no duration value")]
    Missing,

    #[error("duration must be a string, got {value}")]
    NotText { value: String },

    #[error("invalid number of {unit} '{digits}' in '{text}'")]
    InvalidNumber {
        text: String,
        digits: String,
        unit: &'static str,
    },

    #[error("'{text}' is too large to express in minutes")]
    Overflow { text: String },

    #[error("'{text}' is not a PT[nH][nM][nS] duration")]
    Malformed { text: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DurationMode {
    #[default]
    Positional,
    Strict,
}

impl DurationMode {
    pub fn parse(&self, text: &str) -> Result<i64, DurationError> {
        match self {
            DurationMode::Positional => try_parse_duration(text),
            DurationMode::Strict => parse_duration_strict(text),
        }
    }
}

pub fn try_parse_duration(text: &str) -> Result<i64, DurationError> {
    let chars: Vec<char> = text.chars().collect();
    let position = |designator: char| chars.iter().position(|&c| c == designator);
    let hours_index = position('H');

    let hours = match hours_index {
        Some(end) => parse_component(text, &chars, DIGITS_START, end, "hours")?,
        None => 0,
    };

    let minutes = match position('M') {
        Some(end) => {
            let start = hours_index.map_or(DIGITS_START, |h| h + 1);
            parse_component(text, &chars, start, end, "minutes")?
        }
        None => 0,
    };

    to_minutes(text, hours, minutes, 0)
}

/// Positional parse; failures are logged and become `None`.
pub fn parse_duration(text: &str) -> Option<i64> {
    match try_parse_duration(text) {
        Ok(minutes) => Some(minutes),
        Err(e) => {
            tracing::warn!("Error extracting minutes from duration: {}", e);
            None
        }
    }
}

pub fn parse_duration_strict(text: &str) -> Result<i64, DurationError> {
    let malformed = || DurationError::Malformed {
        text: text.to_string(),
    };

    if text.len() <= DIGITS_START {
        return Err(malformed());
    }
    let captures = STRICT_DURATION.captures(text).ok_or_else(malformed)?;

    let component = |index: usize| -> Result<i64, DurationError> {
        match captures.get(index) {
            Some(m) => m.as_str().parse::<i64>().map_err(|_| DurationError::Overflow {
                text: text.to_string(),
            }),
            None => Ok(0),
        }
    };

    to_minutes(text, component(1)?, component(2)?, component(3)?)
}

/// Minutes for a record field. Anything but a parseable string is `None`,
/// with the reason logged.
pub fn duration_minutes(value: Option<&Value>, mode: DurationMode) -> Option<i64> {
    let parsed = match value {
        None | Some(Value::Null) => Err(DurationError::Missing),
        Some(Value::String(text)) => mode.parse(text),
        Some(other) => Err(DurationError::NotText {
            value: other.to_string(),
        }),
    };

    match parsed {
        Ok(minutes) => Some(minutes),
        Err(e) => {
            tracing::warn!("Error extracting minutes from duration: {}", e);
            None
        }
    }
}

fn parse_component(
    text: &str,
    chars: &[char],
    start: usize,
    end: usize,
    unit: &'static str,
) -> Result<i64, DurationError> {
    // An inverted range reads as empty, like an out-of-order slice would.
    let digits: String = if start >= end {
        String::new()
    } else {
        chars[start.min(chars.len())..end.min(chars.len())].iter().collect()
    };

    parse_integer(&digits).ok_or_else(|| DurationError::InvalidNumber {
        text: text.to_string(),
        digits: digits.clone(),
        unit,
    })
}

/// Integer literal with optional surrounding whitespace and sign. Single
/// underscores may separate ASCII digits, as in `1_000`.
fn parse_integer(digits: &str) -> Option<i64> {
    let trimmed = digits.trim();
    let (sign, body) = match trimmed.strip_prefix(['+', '-']) {
        Some(rest) => (&trimmed[..1], rest),
        None => ("", trimmed),
    };

    let well_formed = body
        .split('_')
        .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()));
    if !well_formed {
        return None;
    }

    format!("{}{}", sign, body.replace('_', "")).parse::<i64>().ok()
}

fn to_minutes(text: &str, hours: i64, minutes: i64, seconds: i64) -> Result<i64, DurationError> {
    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .and_then(|m| m.checked_add(seconds / 60))
        .ok_or_else(|| DurationError::Overflow {
            text: text.to_string(),
        })
}
