use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Candle bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timespan {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    Day,
    Month,
}

impl Timespan {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::Day => "day",
            Self::Month => "month",
        }
    }

    /// Polygon aggregate `(multiplier, timespan)` path segments.
    pub const fn polygon_range(self) -> (u32, &'static str) {
        match self {
            Self::OneMinute => (1, "minute"),
            Self::FiveMinutes => (5, "minute"),
            Self::FifteenMinutes => (15, "minute"),
            Self::OneHour => (1, "hour"),
            Self::Day => (1, "day"),
            Self::Month => (1, "month"),
        }
    }

    /// Yahoo chart `interval` query value.
    pub const fn yahoo_interval(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "60m",
            Self::Day => "1d",
            Self::Month => "1mo",
        }
    }

    /// Lookback used for the `max` window against Polygon.
    ///
    /// Finer buckets get shorter ceilings so one request cannot ask for
    /// millions of bars.
    pub const fn polygon_max_days(self) -> i64 {
        match self {
            Self::OneMinute => 7,
            Self::FiveMinutes => 30,
            Self::FifteenMinutes => 60,
            Self::OneHour => 365,
            Self::Day => 7_300,
            Self::Month => 10_950,
        }
    }
}

impl Display for Timespan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timespan {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Self::OneMinute),
            "5m" => Ok(Self::FiveMinutes),
            "15m" => Ok(Self::FifteenMinutes),
            "1h" | "60m" => Ok(Self::OneHour),
            "day" | "1d" => Ok(Self::Day),
            "month" | "1mo" => Ok(Self::Month),
            other => Err(ValidationError::InvalidTimespan {
                value: other.to_owned(),
            }),
        }
    }
}

impl TryFrom<String> for Timespan {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timespan> for String {
    fn from(value: Timespan) -> Self {
        value.as_str().to_owned()
    }
}
