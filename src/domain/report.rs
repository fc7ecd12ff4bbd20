//! Result assembly.
//!
//! Turns unrounded events and accumulator tables into the serializable
//! [`GapReport`]. This is the only place values are rounded: gap and return
//! percentages and averages to 3 decimals, rates to 1, gap magnitudes to 2.

use chrono::NaiveDate;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use super::aggregation::{Accumulator, GapStats, Recommendation, Side, Summary};
use super::bar::weekday_label;
use super::binning::BinTable;
use super::gap_event::GapEvent;
use super::intraday::{IntradayFields, IntradayOverlay};
use super::numeric::{round1, round2, round3};

/// Message carried by a report built from fewer than two daily bars.
pub const NOT_ENOUGH_DATA: &str = "not enough data";

/// One qualifying session as emitted to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapPoint {
    pub date: NaiveDate,
    pub gap_pct: f64,
    pub daily_return_pct: f64,
    pub direction: i8,
    pub same_dir: u8,
    pub filled: u8,
    pub bin: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub prev_close: f64,
    pub dow: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ret_15: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_dir_15: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_15: Option<u8>,
}

impl GapPoint {
    fn new(event: &GapEvent, bins: &BinTable, intraday: Option<&IntradayFields>) -> Self {
        GapPoint {
            date: event.date,
            gap_pct: round3(event.gap_pct),
            daily_return_pct: round3(event.daily_return_pct),
            direction: event.direction.sign(),
            same_dir: u8::from(event.continuation),
            filled: u8::from(event.gap_filled),
            bin: bins.label(event.bin).to_string(),
            open: event.open,
            high: event.high,
            low: event.low,
            close: event.close,
            prev_close: event.prev_close,
            dow: weekday_label(event.weekday),
            ret_15: intraday.map(|f| round3(f.return_pct)),
            same_dir_15: intraday.map(|f| u8::from(f.continuation)),
            filled_15: intraday.map(|f| u8::from(f.gap_filled)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStat {
    pub sessions: usize,
    pub continuation_rate: f64,
    pub gap_ups: usize,
    pub gap_downs: usize,
    pub mean_gap: f64,
    pub max_gap_up: f64,
    pub max_gap_down: f64,
    pub fade_avg: f64,
    pub follow_avg: f64,
    pub best_strategy: Recommendation,
    pub expected_return: f64,
}

impl From<&Summary> for SummaryStat {
    fn from(s: &Summary) -> Self {
        SummaryStat {
            sessions: s.sessions,
            continuation_rate: round1(s.continuation_rate),
            gap_ups: s.gap_ups,
            gap_downs: s.gap_downs,
            mean_gap: round2(s.mean_gap),
            max_gap_up: round2(s.max_gap_up),
            max_gap_down: round2(s.max_gap_down),
            fade_avg: round3(s.fade_avg),
            follow_avg: round3(s.follow_avg),
            best_strategy: s.best_strategy,
            expected_return: round3(s.expected_return),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinStat {
    pub label: String,
    pub count: usize,
    pub continuation_rate: f64,
    pub gap_fill_rate: f64,
    pub fade_avg: f64,
    pub follow_avg: f64,
    pub recommendation: Recommendation,
}

/// Shared shape of the gap-up, gap-down and weekday rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStat {
    pub count: usize,
    pub continuation_rate: f64,
    pub gap_fill_rate: f64,
    pub fade_avg: f64,
    pub follow_avg: f64,
    pub recommendation: Recommendation,
}

pub type SideStat = GroupStat;
pub type DowStat = GroupStat;

impl From<&Accumulator> for GroupStat {
    fn from(acc: &Accumulator) -> Self {
        GroupStat {
            count: acc.count,
            continuation_rate: round1(acc.continuation_rate()),
            gap_fill_rate: round1(acc.fill_rate()),
            fade_avg: round3(acc.fade_avg()),
            follow_avg: round3(acc.follow_avg()),
            recommendation: acc.recommendation(),
        }
    }
}

/// Weekday rows, serialized as a map keyed `Mon`..`Fri` in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct DowTable(pub Vec<(&'static str, DowStat)>);

impl DowTable {
    pub fn get(&self, day: &str) -> Option<&DowStat> {
        self.0.iter().find(|(d, _)| *d == day).map(|(_, s)| s)
    }
}

impl Serialize for DowTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (day, stat) in &self.0 {
            map.serialize_entry(day, stat)?;
        }
        map.end()
    }
}

/// Summary, grouped tables and cumulative series of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapTables {
    pub summary: SummaryStat,
    pub bins: Vec<BinStat>,
    pub by_dow: DowTable,
    pub gap_up: SideStat,
    pub gap_down: SideStat,
    pub cum_dates: Vec<NaiveDate>,
    pub cum_fade: Vec<f64>,
    pub cum_follow: Vec<f64>,
}

impl GapTables {
    pub fn new(stats: &GapStats, bins: &BinTable) -> Self {
        let bin_rows = bins
            .bins()
            .iter()
            .zip(stats.bins.iter())
            .map(|(bin, acc)| BinStat {
                label: bin.label.clone(),
                count: acc.count,
                continuation_rate: round1(acc.continuation_rate()),
                gap_fill_rate: round1(acc.fill_rate()),
                fade_avg: round3(acc.fade_avg()),
                follow_avg: round3(acc.follow_avg()),
                recommendation: acc.recommendation(),
            })
            .collect();

        GapTables {
            summary: SummaryStat::from(&stats.summary()),
            bins: bin_rows,
            by_dow: DowTable(
                stats
                    .by_weekday()
                    .map(|(day, acc)| (weekday_label(day), DowStat::from(acc)))
                    .collect(),
            ),
            gap_up: SideStat::from(stats.side(Side::Up)),
            gap_down: SideStat::from(stats.side(Side::Down)),
            cum_dates: stats.cumulative.dates.clone(),
            cum_fade: stats.cumulative.fade.iter().copied().map(round3).collect(),
            cum_follow: stats.cumulative.follow.iter().copied().map(round3).collect(),
        }
    }
}

/// Opening-window layer of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntradayReport {
    pub sessions: usize,
    #[serde(flatten)]
    pub tables: GapTables,
}

/// Full analysis result returned to HTTP and CLI clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub ticker: String,
    pub years: u32,
    pub min_gap: f64,
    pub data: Vec<GapPoint>,
    #[serde(flatten)]
    pub daily: GapTables,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intraday: Option<IntradayReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intraday_error: Option<String>,
}

/// Request echo carried on every report.
#[derive(Debug, Clone, Copy)]
pub struct ReportHeader<'a> {
    pub ticker: &'a str,
    pub years: u32,
    pub min_gap: f64,
}

impl GapReport {
    pub fn build(
        header: ReportHeader<'_>,
        events: &[GapEvent],
        stats: &GapStats,
        bins: &BinTable,
        overlay: Option<&IntradayOverlay>,
    ) -> Self {
        let data = events
            .iter()
            .enumerate()
            .map(|(i, event)| {
                let fields = overlay.and_then(|o| o.fields.get(i)).and_then(Option::as_ref);
                GapPoint::new(event, bins, fields)
            })
            .collect();

        GapReport {
            success: true,
            error: None,
            ticker: header.ticker.to_string(),
            years: header.years,
            min_gap: header.min_gap,
            data,
            daily: GapTables::new(stats, bins),
            intraday: overlay.map(|o| IntradayReport {
                sessions: o.sessions(),
                tables: GapTables::new(&o.stats, bins),
            }),
            intraday_error: None,
        }
    }

    /// Non-success report with zeroed tables.
    pub fn failure(header: ReportHeader<'_>, bins: &BinTable, message: impl Into<String>) -> Self {
        GapReport {
            success: false,
            error: Some(message.into()),
            ..Self::build(header, &[], &GapStats::default(), bins, None)
        }
    }

    pub fn with_intraday_error(mut self, message: impl Into<String>) -> Self {
        self.intraday = None;
        self.intraday_error = Some(message.into());
        self
    }
}
