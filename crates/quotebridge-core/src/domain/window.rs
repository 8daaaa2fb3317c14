use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::{Timespan, ValidationError};

/// Longest relative window accepted, in days (100 years).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Unit suffix of a relative window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowUnit {
    Days,
    Weeks,
    /// Approximated as 30 days.
    Months,
    /// Approximated as 365 days.
    Years,
}

impl WindowUnit {
    const fn days(self) -> i64 {
        match self {
            Self::Days => 1,
            Self::Weeks => 7,
            Self::Months => 30,
            Self::Years => 365,
        }
    }

    const fn suffix(self) -> char {
        match self {
            Self::Days => 'd',
            Self::Weeks => 'w',
            Self::Months => 'm',
            Self::Years => 'y',
        }
    }
}

/// Lookback window relative to now, e.g. `5d`, `3m` or `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Relative { amount: u32, unit: WindowUnit },
    /// Longest range the provider is asked for; resolved per timespan.
    Max,
}

impl Window {
    /// Duration in days for relative windows; `None` for `max`.
    pub fn days(self) -> Option<i64> {
        match self {
            Self::Relative { amount, unit } => Some(i64::from(amount) * unit.days()),
            Self::Max => None,
        }
    }

    /// Duration in days requested from Polygon for the given bucket width.
    pub fn polygon_days(self, timespan: Timespan) -> i64 {
        self.days()
            .unwrap_or_else(|| timespan.polygon_max_days())
    }

    /// Yahoo chart `range` query value.
    pub fn yahoo_range(self) -> String {
        match self {
            Self::Relative { amount, unit } => match unit {
                WindowUnit::Days => format!("{amount}d"),
                WindowUnit::Weeks => format!("{}d", u64::from(amount) * 7),
                WindowUnit::Months => format!("{amount}mo"),
                WindowUnit::Years => format!("{amount}y"),
            },
            Self::Max => String::from("max"),
        }
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Relative { amount, unit } => write!(f, "{amount}{}", unit.suffix()),
            Self::Max => f.write_str("max"),
        }
    }
}

/// Parses `<n><d|w|m|y>` or `max`. `n` must be positive and the window
/// must fit in [`MAX_WINDOW_DAYS`].
impl FromStr for Window {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || ValidationError::InvalidWindow {
            value: trimmed.to_owned(),
        };

        if trimmed.eq_ignore_ascii_case("max") {
            return Ok(Self::Max);
        }

        let mut chars = trimmed.chars();
        let unit = match chars.next_back() {
            Some('d') => WindowUnit::Days,
            Some('w') => WindowUnit::Weeks,
            Some('m') => WindowUnit::Months,
            Some('y') => WindowUnit::Years,
            _ => return Err(invalid()),
        };

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let amount = digits.parse::<u32>().map_err(|_| invalid())?;
        if amount == 0 {
            return Err(invalid());
        }

        let window = Self::Relative { amount, unit };
        if window.days().is_some_and(|days| days > MAX_WINDOW_DAYS) {
            return Err(ValidationError::WindowTooLong {
                value: trimmed.to_owned(),
                max_days: MAX_WINDOW_DAYS,
            });
        }
        Ok(window)
    }
}
