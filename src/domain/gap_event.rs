//! Daily gap event extraction.
//!
//! Walks consecutive session pairs `(prev, day)` and emits one [`GapEvent`]
//! for each pair whose opening gap clears the threshold. Pairs with a
//! non-positive prior close or open are skipped without affecting later pairs.

use chrono::{NaiveDate, Weekday};

use super::bar::Bar;
use super::binning::BinTable;
use super::error::GapError;
use super::numeric::{pct_move, sign};

/// Exclusive upper bound for the minimum gap threshold, in percent.
pub const MAX_MIN_GAP: f64 = 20.0;

/// Minimum absolute gap percentage, validated to `0 < x < 20`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct GapThreshold(f64);

impl GapThreshold {
    pub const DEFAULT: GapThreshold = GapThreshold(0.3);

    pub fn new(pct: f64) -> Result<Self, GapError> {
        if !pct.is_finite() || pct <= 0.0 || pct >= MAX_MIN_GAP {
            return Err(GapError::invalid_parameter(
                "min_gap",
                format!("must be greater than 0 and less than {MAX_MIN_GAP}, got {pct}"),
            ));
        }
        Ok(Self(pct))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for GapThreshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn of(value: f64) -> Self {
        match sign(value) {
            1 => Direction::Up,
            -1 => Direction::Down,
            _ => Direction::Flat,
        }
    }

    pub fn sign(self) -> i8 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Flat => 0,
        }
    }

    /// Return of a position held with the gap.
    pub fn follow(self, return_pct: f64) -> f64 {
        f64::from(self.sign()) * return_pct
    }

    /// Return of a position held against the gap.
    pub fn fade(self, return_pct: f64) -> f64 {
        -f64::from(self.sign()) * return_pct
    }

    /// A move continues the gap only when both are non-zero and share a sign.
    pub fn continued_by(self, return_pct: f64) -> bool {
        self != Direction::Flat && return_pct != 0.0 && sign(return_pct) == self.sign()
    }

    /// Whether the `[low, high]` range retraced to the prior close.
    pub fn filled(self, low: f64, high: f64, prev_close: f64) -> bool {
        match self {
            Direction::Up => low <= prev_close,
            Direction::Down => high >= prev_close,
            Direction::Flat => false,
        }
    }
}

/// One qualifying session. Values are unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct GapEvent {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub gap_pct: f64,
    pub daily_return_pct: f64,
    pub direction: Direction,
    pub continuation: bool,
    pub gap_filled: bool,
    /// Bin index, `None` for "other".
    pub bin: Option<usize>,
    pub prev_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl GapEvent {
    pub fn follow_return(&self) -> f64 {
        self.direction.follow(self.daily_return_pct)
    }

    pub fn fade_return(&self) -> f64 {
        self.direction.fade(self.daily_return_pct)
    }
}

/// Observation fed to the aggregation engine. The daily layer and the
/// intraday layer both reduce to this shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapSample {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub gap_pct: f64,
    pub direction: Direction,
    pub return_pct: f64,
    pub continuation: bool,
    pub gap_filled: bool,
    pub bin: Option<usize>,
}

impl GapSample {
    pub fn follow_return(&self) -> f64 {
        self.direction.follow(self.return_pct)
    }

    pub fn fade_return(&self) -> f64 {
        self.direction.fade(self.return_pct)
    }
}

impl From<&GapEvent> for GapSample {
    fn from(event: &GapEvent) -> Self {
        GapSample {
            date: event.date,
            weekday: event.weekday,
            gap_pct: event.gap_pct,
            direction: event.direction,
            return_pct: event.daily_return_pct,
            continuation: event.continuation,
            gap_filled: event.gap_filled,
            bin: event.bin,
        }
    }
}

/// Derives the gap events of an ascending daily bar sequence.
pub fn extract_gap_events(bars: &[Bar], threshold: GapThreshold, bins: &BinTable) -> Vec<GapEvent> {
    bars.windows(2)
        .filter_map(|pair| gap_event(&pair[0], &pair[1], threshold, bins))
        .collect()
}

fn gap_event(prev: &Bar, day: &Bar, threshold: GapThreshold, bins: &BinTable) -> Option<GapEvent> {
    let prev_close = prev.close;
    if prev_close <= 0.0 || day.open <= 0.0 {
        return None;
    }

    let gap_pct = pct_move(prev_close, day.open);
    if gap_pct.abs() < threshold.value() {
        return None;
    }

    let daily_return_pct = pct_move(day.open, day.close);
    let direction = Direction::of(gap_pct);

    Some(GapEvent {
        date: day.session_date(),
        weekday: day.weekday(),
        gap_pct,
        daily_return_pct,
        direction,
        continuation: direction.continued_by(daily_return_pct),
        gap_filled: direction.filled(day.low, day.high, prev_close),
        bin: bins.classify(gap_pct.abs()),
        prev_close,
        open: day.open,
        high: day.high,
        low: day.low,
        close: day.close,
    })
}
