//! Opening-window (09:30–09:45) overlay.
//!
//! Second pass over the sessions that already qualified in the daily pass.
//! For each of them the first fifteen minutes of the regular session are
//! measured against the same prior close, and the aggregation is replayed on
//! the resulting samples.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use super::aggregation::GapStats;
use super::bar::{Bar, exchange_instant};
use super::gap_event::{GapEvent, GapSample};
use super::numeric::pct_move;

/// Length of the measured opening window.
pub const OPENING_WINDOW_MINUTES: i64 = 15;

pub fn session_open_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN)
}

/// Intraday bars grouped by session date.
pub type IntradayBars = BTreeMap<NaiveDate, Vec<Bar>>;

/// Opening-window measurements attached to a daily event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntradayFields {
    pub open_0930: f64,
    pub close_0945: f64,
    pub return_pct: f64,
    pub continuation: bool,
    pub gap_filled: bool,
}

/// Output of the overlay: per-event fields (aligned with the input events)
/// and the replayed aggregation over the sessions that had data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntradayOverlay {
    pub fields: Vec<Option<IntradayFields>>,
    pub stats: GapStats,
}

impl IntradayOverlay {
    /// Sessions that contributed to the intraday layer.
    pub fn sessions(&self) -> usize {
        self.stats.total.count
    }
}

/// Ascending, de-duplicated session dates of the daily events. These are the
/// only dates the intraday source is asked for.
pub fn qualifying_dates(events: &[GapEvent]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// `[09:30, 09:45)` New York time on `date`, as UTC instants.
pub fn opening_window(date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = exchange_instant(date, session_open_time())?;
    Some((start, start + Duration::minutes(OPENING_WINDOW_MINUTES)))
}

/// Measures the opening window of `event`'s session from its intraday bars.
///
/// Returns `None` when no bar starts inside the window.
pub fn measure_opening(event: &GapEvent, bars: &[Bar]) -> Option<IntradayFields> {
    let (start, end) = opening_window(event.date)?;
    let window: Vec<&Bar> = bars
        .iter()
        .filter(|b| b.timestamp >= start && b.timestamp < end)
        .collect();
    let last = window.last()?;

    let open_0930 = window
        .iter()
        .find(|b| b.timestamp == start)
        .map(|b| b.open)
        .unwrap_or(event.open);
    if open_0930 <= 0.0 {
        return None;
    }

    let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let return_pct = pct_move(open_0930, last.close);

    Some(IntradayFields {
        open_0930,
        close_0945: last.close,
        return_pct,
        continuation: event.direction.continued_by(return_pct),
        gap_filled: event.direction.filled(low, high, event.prev_close),
    })
}

/// Replays the aggregation over the opening window of each daily event.
/// Sessions without intraday bars are left out of the intraday layer.
pub fn overlay_intraday(events: &[GapEvent], bars_by_date: &IntradayBars) -> IntradayOverlay {
    let mut overlay = IntradayOverlay {
        fields: Vec::with_capacity(events.len()),
        stats: GapStats::default(),
    };

    for event in events {
        let fields = bars_by_date
            .get(&event.date)
            .and_then(|bars| measure_opening(event, bars));
        if let Some(f) = &fields {
            overlay.stats.push(&GapSample {
                return_pct: f.return_pct,
                continuation: f.continuation,
                gap_filled: f.gap_filled,
                ..GapSample::from(event)
            });
        }
        overlay.fields.push(fields);
    }

    overlay
}
