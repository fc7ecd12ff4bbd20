#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use gapscope::domain::bar::{Bar, exchange_instant};
use gapscope::domain::error::GapError;
use gapscope::ports::bar_port::{BarPort, Resolution};
use std::collections::HashMap;
use std::sync::Mutex;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn at(d: &str, hm: &str) -> chrono::DateTime<chrono::Utc> {
    let time = NaiveTime::parse_from_str(hm, "%H:%M").unwrap();
    exchange_instant(date(d), time).unwrap()
}

/// Daily bar stamped at local midnight, the way aggregate APIs report them.
pub fn daily_bar(d: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: at(d, "00:00"),
        open,
        high,
        low,
        close,
        volume: 1_000_000.0,
    }
}

pub fn minute_bar(d: &str, hm: &str, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar {
        timestamp: at(d, hm),
        open,
        high,
        low,
        close,
        volume: 10_000.0,
    }
}

/// Prior close 100 on Fri 2024-03-01, then four sessions:
///
/// | date       | gap     | return  | cont | filled |
/// |------------|---------|---------|------|--------|
/// | 03-04 Mon  | +1.2%   | +0.30%  | yes  | no     |
/// | 03-05 Tue  | +0.10%  | (below threshold)      |
/// | 03-06 Wed  | -0.99%  | -0.20%  | yes  | yes    |
/// | 03-07 Thu  | +0.60%  | -0.40%  | no   | yes    |
pub fn sample_daily_bars() -> Vec<Bar> {
    vec![
        daily_bar("2024-03-01", 99.5, 100.5, 99.0, 100.0),
        daily_bar("2024-03-04", 101.2, 102.0, 100.8, 101.5),
        daily_bar("2024-03-05", 101.6, 101.9, 100.9, 101.0),
        daily_bar("2024-03-06", 100.0, 101.2, 99.5, 99.8),
        daily_bar("2024-03-07", 100.4, 100.5, 99.7, 100.0),
    ]
}

pub fn sample_today() -> NaiveDate {
    date("2024-03-08")
}

/// Opening-window bars for Mon 03-04 (continues up) and Wed 03-06 (reverses
/// up, filling the gap). Thu 03-07 has none.
pub fn sample_intraday_bars() -> HashMap<NaiveDate, Vec<Bar>> {
    let mut map = HashMap::new();
    map.insert(
        date("2024-03-04"),
        vec![
            minute_bar("2024-03-04", "09:30", 101.2, 101.4, 101.1, 101.3),
            minute_bar("2024-03-04", "09:37", 101.3, 101.7, 101.2, 101.6),
            minute_bar("2024-03-04", "09:44", 101.6, 101.8, 101.5, 101.7),
            // Outside the window.
            minute_bar("2024-03-04", "09:45", 101.7, 101.9, 99.0, 99.5),
        ],
    );
    map.insert(
        date("2024-03-06"),
        vec![
            minute_bar("2024-03-06", "09:30", 100.0, 100.4, 99.9, 100.3),
            minute_bar("2024-03-06", "09:44", 100.3, 101.1, 100.2, 101.0),
        ],
    );
    map
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub ticker: String,
    pub resolution: Resolution,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// In-memory [`BarPort`] that records every request.
pub struct MockBarPort {
    pub daily: Vec<Bar>,
    pub intraday: HashMap<NaiveDate, Vec<Bar>>,
    pub daily_error: Option<String>,
    pub intraday_error: Option<String>,
    pub calls: Mutex<Vec<RecordedCall>>,
}

impl MockBarPort {
    pub fn new() -> Self {
        Self {
            daily: Vec::new(),
            intraday: HashMap::new(),
            daily_error: None,
            intraday_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn sample() -> Self {
        Self::new()
            .with_daily(sample_daily_bars())
            .with_intraday(sample_intraday_bars())
    }

    pub fn with_daily(mut self, bars: Vec<Bar>) -> Self {
        self.daily = bars;
        self
    }

    pub fn with_intraday(mut self, bars: HashMap<NaiveDate, Vec<Bar>>) -> Self {
        self.intraday = bars;
        self
    }

    pub fn with_daily_error(mut self, reason: &str) -> Self {
        self.daily_error = Some(reason.to_string());
        self
    }

    pub fn with_intraday_error(mut self, reason: &str) -> Self {
        self.intraday_error = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn intraday_dates(&self) -> Vec<NaiveDate> {
        self.calls()
            .into_iter()
            .filter(|c| c.resolution != Resolution::Day)
            .map(|c| c.from)
            .collect()
    }
}

#[async_trait]
impl BarPort for MockBarPort {
    async fn fetch_bars(
        &self,
        ticker: &str,
        resolution: Resolution,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, GapError> {
        self.calls.lock().unwrap().push(RecordedCall {
            ticker: ticker.to_string(),
            resolution,
            from,
            to,
        });

        if resolution == Resolution::Day {
            if let Some(reason) = &self.daily_error {
                return Err(GapError::upstream(reason.clone()));
            }
            return Ok(self
                .daily
                .iter()
                .filter(|b| (from..=to).contains(&b.session_date()))
                .cloned()
                .collect());
        }

        if let Some(reason) = &self.intraday_error {
            return Err(GapError::upstream(reason.clone()));
        }
        Ok(self.intraday.get(&from).cloned().unwrap_or_default())
    }
}
