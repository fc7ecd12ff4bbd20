//! Price bar representation and exchange-local calendar helpers.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// Time zone every session date and intraday window is expressed in.
pub const EXCHANGE_TZ: Tz = New_York;

/// One OHLCV sample over a fixed interval. `timestamp` is the interval start.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Interval start in exchange-local time.
    pub fn local_time(&self) -> DateTime<Tz> {
        self.timestamp.with_timezone(&EXCHANGE_TZ)
    }

    /// Session date in the exchange's calendar.
    pub fn session_date(&self) -> NaiveDate {
        self.local_time().date_naive()
    }

    pub fn weekday(&self) -> Weekday {
        self.local_time().weekday()
    }
}

/// Converts an exchange-local wall time on `date` into a UTC instant.
///
/// Regular-session times never fall in a DST transition, so the earliest
/// mapping is taken when the local time is ambiguous.
pub fn exchange_instant(date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    EXCHANGE_TZ
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Current date on the exchange calendar.
pub fn exchange_today() -> NaiveDate {
    Utc::now().with_timezone(&EXCHANGE_TZ).date_naive()
}

/// Three-letter weekday label (`Mon`..`Sun`).
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}
