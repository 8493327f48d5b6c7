//! Standard history timeframes.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Standard MetaTrader timeframe.
///
/// The numeric id written into history headers is the period length in
/// minutes (`MN1` uses the conventional 43200).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Period {
    /// 1-minute bars.
    #[default]
    #[serde(rename = "M1")]
    M1,
    /// 5-minute bars.
    #[serde(rename = "M5")]
    M5,
    /// 15-minute bars.
    #[serde(rename = "M15")]
    M15,
    /// 30-minute bars.
    #[serde(rename = "M30")]
    M30,
    /// 1-hour bars.
    #[serde(rename = "H1")]
    H1,
    /// 4-hour bars.
    #[serde(rename = "H4")]
    H4,
    /// Daily bars.
    #[serde(rename = "D1")]
    D1,
    /// Weekly bars, Monday aligned.
    #[serde(rename = "W1")]
    W1,
    /// Monthly bars, aligned to the first of the month.
    #[serde(rename = "MN1")]
    MN1,
}

impl Period {
    /// Returns the timeframe id in minutes.
    #[must_use]
    pub const fn minutes(&self) -> u32 {
        match self {
            Self::M1 => 1,
            Self::M5 => 5,
            Self::M15 => 15,
            Self::M30 => 30,
            Self::H1 => 60,
            Self::H4 => 240,
            Self::D1 => 1440,
            Self::W1 => 10080,
            Self::MN1 => 43200,
        }
    }

    /// Returns the fixed bucket width in seconds, or `None` for `MN1`.
    #[must_use]
    pub const fn fixed_seconds(&self) -> Option<i64> {
        match self {
            Self::MN1 => None,
            other => Some(other.minutes() as i64 * 60),
        }
    }

    /// Looks up a period by its minute id.
    #[must_use]
    pub const fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            1 => Some(Self::M1),
            5 => Some(Self::M5),
            15 => Some(Self::M15),
            30 => Some(Self::M30),
            60 => Some(Self::H1),
            240 => Some(Self::H4),
            1440 => Some(Self::D1),
            10080 => Some(Self::W1),
            43200 => Some(Self::MN1),
            _ => None,
        }
    }

    /// Returns the period as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "M1",
            Self::M5 => "M5",
            Self::M15 => "M15",
            Self::M30 => "M30",
            Self::H1 => "H1",
            Self::H4 => "H4",
            Self::D1 => "D1",
            Self::W1 => "W1",
            Self::MN1 => "MN1",
        }
    }

    /// Returns all standard periods, shortest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::M1,
            Self::M5,
            Self::M15,
            Self::M30,
            Self::H1,
            Self::H4,
            Self::D1,
            Self::W1,
            Self::MN1,
        ]
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(minutes) = s.parse::<u32>() {
            return Self::from_minutes(minutes).ok_or_else(|| PeriodParseError(s.to_string()));
        }
        match s.to_uppercase().as_str() {
            "M1" => Ok(Self::M1),
            "M5" => Ok(Self::M5),
            "M15" => Ok(Self::M15),
            "M30" => Ok(Self::M30),
            "H1" => Ok(Self::H1),
            "H4" => Ok(Self::H4),
            "D1" | "DAILY" => Ok(Self::D1),
            "W1" | "WEEKLY" => Ok(Self::W1),
            "MN1" | "MN" | "MONTHLY" => Ok(Self::MN1),
            _ => Err(PeriodParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid period string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodParseError(String);

impl std::fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid period '{}', expected one of: M1, M5, M15, M30, H1, H4, D1, W1, MN1",
            self.0
        )
    }
}

impl std::error::Error for PeriodParseError {}
