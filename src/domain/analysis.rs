//! Analysis pipeline.
//!
//! Daily pass: fetch the full range of daily bars, extract gap events and fold
//! them. Intraday pass: fetch intraday bars only for the session dates the
//! daily pass selected, then replay the aggregation on the opening window.
//! Both passes are pure functions; [`run_analysis`] wires them to a
//! [`BarPort`].

use std::time::Duration;

use chrono::{Months, NaiveDate};
use tracing::{debug, info, warn};

use super::aggregation::GapStats;
use super::bar::Bar;
use super::binning::BinTable;
use super::error::GapError;
use super::gap_event::{GapEvent, GapSample, GapThreshold, extract_gap_events};
use super::intraday::{IntradayBars, IntradayOverlay, overlay_intraday, qualifying_dates};
use super::report::{GapReport, NOT_ENOUGH_DATA, ReportHeader};
use crate::ports::bar_port::{BarPort, Resolution};

pub const MIN_DAILY_BARS: usize = 2;
pub const MIN_YEARS: u32 = 1;
pub const MAX_YEARS: u32 = 5;
pub const DEFAULT_YEARS: u32 = 3;
const MAX_TICKER_LEN: usize = 10;

/// Validated parameters of one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub ticker: String,
    pub years: u32,
    pub threshold: GapThreshold,
    pub intraday: bool,
}

impl AnalysisRequest {
    pub fn new(ticker: &str, years: u32, min_gap: f64, intraday: bool) -> Result<Self, GapError> {
        if !(MIN_YEARS..=MAX_YEARS).contains(&years) {
            return Err(GapError::invalid_parameter(
                "years",
                format!("must be between {MIN_YEARS} and {MAX_YEARS}, got {years}"),
            ));
        }
        Ok(Self {
            ticker: normalize_ticker(ticker)?,
            years,
            threshold: GapThreshold::new(min_gap)?,
            intraday,
        })
    }

    /// `[today - years, today]`.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = today
            .checked_sub_months(Months::new(self.years * 12))
            .unwrap_or(NaiveDate::MIN);
        (from, today)
    }

    pub fn bin_table(&self) -> BinTable {
        BinTable::new(self.threshold.value())
    }

    fn header(&self) -> ReportHeader<'_> {
        ReportHeader {
            ticker: &self.ticker,
            years: self.years,
            min_gap: self.threshold.value(),
        }
    }
}

/// Trims and upper-cases a ticker, rejecting anything that is not a plain
/// exchange symbol.
pub fn normalize_ticker(raw: &str) -> Result<String, GapError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(GapError::invalid_parameter("ticker", "ticker required"));
    }
    if ticker.len() > MAX_TICKER_LEN
        || !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(GapError::invalid_parameter(
            "ticker",
            format!("'{ticker}' is not a valid symbol"),
        ));
    }
    Ok(ticker)
}

/// How the intraday pass talks to the bar source.
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayOptions {
    pub resolution: Resolution,
    /// Delay between consecutive intraday requests.
    pub pacing: Duration,
    /// Upper bound on sessions fetched; the most recent ones are kept.
    pub max_sessions: usize,
}

impl Default for IntradayOptions {
    fn default() -> Self {
        Self {
            resolution: Resolution::Minute,
            pacing: Duration::from_millis(250),
            max_sessions: 250,
        }
    }
}

/// Output of the daily pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAnalysis {
    pub bins: BinTable,
    pub events: Vec<GapEvent>,
    pub stats: GapStats,
}

/// Extracts and folds the daily gap events of `bars`.
pub fn analyze_daily(
    ticker: &str,
    bars: &[Bar],
    threshold: GapThreshold,
) -> Result<DailyAnalysis, GapError> {
    if bars.len() < MIN_DAILY_BARS {
        return Err(GapError::InsufficientData {
            ticker: ticker.to_string(),
            bars: bars.len(),
            minimum: MIN_DAILY_BARS,
        });
    }
    let bins = BinTable::new(threshold.value());
    let events = extract_gap_events(bars, threshold, &bins);
    let stats = GapStats::fold(events.iter().map(GapSample::from));
    Ok(DailyAnalysis {
        bins,
        events,
        stats,
    })
}

/// Fetches intraday bars for `dates`, one request per date.
///
/// Dates with no bars are left out of the map. The first failed request
/// aborts the pass.
pub async fn fetch_intraday(
    port: &dyn BarPort,
    ticker: &str,
    dates: &[NaiveDate],
    options: &IntradayOptions,
) -> Result<IntradayBars, GapError> {
    let skip = dates.len().saturating_sub(options.max_sessions);
    if skip > 0 {
        info!(
            ticker,
            skipped = skip,
            max_sessions = options.max_sessions,
            "intraday session cap reached, keeping most recent sessions"
        );
    }

    let mut by_date = IntradayBars::new();
    for (i, &date) in dates.iter().skip(skip).enumerate() {
        if i > 0 && !options.pacing.is_zero() {
            tokio::time::sleep(options.pacing).await;
        }
        let bars = port
            .fetch_bars(ticker, options.resolution, date, date)
            .await?;
        let bars: Vec<Bar> = bars
            .into_iter()
            .filter(|b| b.session_date() == date)
            .collect();
        debug!(ticker, %date, bars = bars.len(), "fetched intraday bars");
        if !bars.is_empty() {
            by_date.insert(date, bars);
        }
    }
    Ok(by_date)
}

/// Runs the full two-pass analysis for `request` against `port`.
///
/// A daily fetch failure is returned as an error. Fewer than two daily bars
/// yields a non-success report. An intraday fetch failure yields the daily
/// report annotated with `intraday_error`.
pub async fn run_analysis(
    port: &dyn BarPort,
    request: &AnalysisRequest,
    today: NaiveDate,
    options: &IntradayOptions,
) -> Result<GapReport, GapError> {
    let (from, to) = request.date_range(today);
    info!(ticker = %request.ticker, %from, %to, min_gap = request.threshold.value(), "running gap analysis");

    let bars = port
        .fetch_bars(&request.ticker, Resolution::Day, from, to)
        .await?;

    let daily = match analyze_daily(&request.ticker, &bars, request.threshold) {
        Ok(daily) => daily,
        Err(GapError::InsufficientData { bars, .. }) => {
            warn!(ticker = %request.ticker, bars, "not enough daily bars");
            return Ok(GapReport::failure(
                request.header(),
                &request.bin_table(),
                NOT_ENOUGH_DATA,
            ));
        }
        Err(e) => return Err(e),
    };
    info!(
        ticker = %request.ticker,
        bars = bars.len(),
        events = daily.events.len(),
        "daily pass complete"
    );

    if !request.intraday || daily.events.is_empty() {
        return Ok(report(request, &daily, None));
    }

    let dates = qualifying_dates(&daily.events);
    match fetch_intraday(port, &request.ticker, &dates, options).await {
        Ok(by_date) => {
            let overlay = overlay_intraday(&daily.events, &by_date);
            info!(
                ticker = %request.ticker,
                requested = dates.len(),
                sessions = overlay.sessions(),
                "intraday pass complete"
            );
            Ok(report(request, &daily, Some(&overlay)))
        }
        Err(e) => {
            warn!(ticker = %request.ticker, error = %e, "intraday pass failed, returning daily results");
            Ok(report(request, &daily, None).with_intraday_error(format!("intraday data unavailable: {e}")))
        }
    }
}

fn report(request: &AnalysisRequest, daily: &DailyAnalysis, overlay: Option<&IntradayOverlay>) -> GapReport {
    GapReport::build(
        request.header(),
        &daily.events,
        &daily.stats,
        &daily.bins,
        overlay,
    )
}
