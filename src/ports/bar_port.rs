//! Bar source port trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::bar::Bar;
use crate::domain::error::GapError;

/// Bar interval requested from a [`BarPort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Day,
    Minute,
    FifteenMinute,
}

impl Resolution {
    /// `(multiplier, timespan)` pair used by aggregate-bar APIs.
    pub fn span(self) -> (u32, &'static str) {
        match self {
            Resolution::Day => (1, "day"),
            Resolution::Minute => (1, "minute"),
            Resolution::FifteenMinute => (15, "minute"),
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = GapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "1d" => Ok(Resolution::Day),
            "minute" | "1m" => Ok(Resolution::Minute),
            "15minute" | "15m" => Ok(Resolution::FifteenMinute),
            other => Err(GapError::invalid_parameter(
                "resolution",
                format!("unknown resolution '{other}'"),
            )),
        }
    }
}

/// Supplies ascending OHLCV bars for a ticker over an inclusive date range.
#[async_trait]
pub trait BarPort: Send + Sync {
    async fn fetch_bars(
        &self,
        ticker: &str,
        resolution: Resolution,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, GapError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resolutions() {
        assert_eq!("minute".parse::<Resolution>().unwrap(), Resolution::Minute);
        assert_eq!("15Minute".parse::<Resolution>().unwrap(), Resolution::FifteenMinute);
        assert_eq!("day".parse::<Resolution>().unwrap(), Resolution::Day);
        assert!("hour".parse::<Resolution>().is_err());
    }

    #[test]
    fn spans() {
        assert_eq!(Resolution::FifteenMinute.span(), (15, "minute"));
        assert_eq!(Resolution::Day.span(), (1, "day"));
    }
}
