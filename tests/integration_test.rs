//! End-to-end tests of the analysis pipeline against an in-memory bar source.

mod common;

use approx::assert_abs_diff_eq;
use gapscope::domain::aggregation::Recommendation;
use gapscope::domain::analysis::{AnalysisRequest, IntradayOptions, run_analysis};
use gapscope::domain::error::GapError;
use gapscope::domain::report::NOT_ENOUGH_DATA;
use gapscope::ports::bar_port::Resolution;
use std::time::Duration;

use common::*;

fn options() -> IntradayOptions {
    IntradayOptions {
        pacing: Duration::ZERO,
        ..IntradayOptions::default()
    }
}

fn request(intraday: bool) -> AnalysisRequest {
    AnalysisRequest::new("spy", 1, 0.3, intraday).unwrap()
}

#[tokio::test]
async fn daily_report_from_sample_bars() {
    let port = MockBarPort::sample();
    let report = run_analysis(&port, &request(false), sample_today(), &options())
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.error, None);
    assert_eq!(report.ticker, "SPY");
    assert_eq!(report.years, 1);
    assert_eq!(report.min_gap, 0.3);

    let dates: Vec<_> = report.data.iter().map(|p| p.date).collect();
    assert_eq!(
        dates,
        vec![date("2024-03-04"), date("2024-03-06"), date("2024-03-07")]
    );

    let s = &report.daily.summary;
    assert_eq!(s.sessions, 3);
    assert_eq!(s.gap_ups, 2);
    assert_eq!(s.gap_downs, 1);
    assert_eq!(s.continuation_rate, 66.7);
    assert_eq!(s.max_gap_up, 1.2);
    assert_eq!(s.max_gap_down, -0.99);
    assert_abs_diff_eq!(s.mean_gap, 0.93, epsilon = 1e-9);
    assert_eq!(s.best_strategy, Recommendation::Follow);
    assert_eq!(s.expected_return, s.follow_avg);
    assert_abs_diff_eq!(s.fade_avg, -s.follow_avg, epsilon = 1e-9);

    let counts: Vec<usize> = report.daily.bins.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![0, 2, 1, 0]);

    assert_eq!(report.daily.gap_up.count, 2);
    assert_eq!(report.daily.gap_up.continuation_rate, 50.0);
    assert_eq!(report.daily.gap_down.count, 1);
    assert_eq!(report.daily.gap_down.continuation_rate, 100.0);

    assert_eq!(report.daily.by_dow.get("Mon").unwrap().count, 1);
    assert_eq!(report.daily.by_dow.get("Tue").unwrap().count, 0);
    assert_eq!(report.daily.by_dow.get("Wed").unwrap().count, 1);
    assert_eq!(report.daily.by_dow.get("Thu").unwrap().count, 1);
    assert_eq!(report.daily.by_dow.get("Fri").unwrap().count, 0);

    assert_eq!(report.daily.cum_dates, dates);
    assert_eq!(report.daily.cum_fade.len(), 3);
    assert!(report.intraday.is_none());
    assert!(report.intraday_error.is_none());

    // No intraday requests without the flag.
    assert!(port.intraday_dates().is_empty());
}

#[tokio::test]
async fn daily_request_covers_lookback_window() {
    let port = MockBarPort::sample();
    run_analysis(&port, &request(false), sample_today(), &options())
        .await
        .unwrap();

    let calls = port.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].ticker, "SPY");
    assert_eq!(calls[0].resolution, Resolution::Day);
    assert_eq!(calls[0].from, date("2023-03-08"));
    assert_eq!(calls[0].to, date("2024-03-08"));
}

#[tokio::test]
async fn intraday_overlay_only_fetches_qualifying_sessions() {
    let port = MockBarPort::sample();
    let report = run_analysis(&port, &request(true), sample_today(), &options())
        .await
        .unwrap();

    assert_eq!(
        port.intraday_dates(),
        vec![date("2024-03-04"), date("2024-03-06"), date("2024-03-07")]
    );
    assert!(
        port.calls()
            .iter()
            .filter(|c| c.resolution != Resolution::Day)
            .all(|c| c.resolution == Resolution::Minute && c.from == c.to)
    );

    let intraday = report.intraday.as_ref().expect("intraday layer");
    assert_eq!(intraday.sessions, 2);
    assert_eq!(intraday.tables.summary.sessions, 2);
    assert_eq!(intraday.tables.summary.continuation_rate, 50.0);
    assert_eq!(intraday.tables.gap_up.count, 1);
    assert_eq!(intraday.tables.gap_down.count, 1);
    assert_eq!(intraday.tables.gap_down.gap_fill_rate, 100.0);

    let mon = &report.data[0];
    assert_eq!(mon.ret_15, Some(0.494));
    assert_eq!(mon.same_dir_15, Some(1));
    assert_eq!(mon.filled_15, Some(0));

    let wed = &report.data[1];
    assert_eq!(wed.ret_15, Some(1.0));
    assert_eq!(wed.same_dir_15, Some(0));
    assert_eq!(wed.filled_15, Some(1));

    // No bars in the opening window: daily point kept, intraday fields absent.
    let thu = &report.data[2];
    assert_eq!(thu.ret_15, None);
    assert_eq!(thu.same_dir_15, None);

    // Daily tables are unaffected by the overlay.
    assert_eq!(report.daily.summary.sessions, 3);
}

#[tokio::test]
async fn intraday_failure_keeps_daily_results() {
    let port = MockBarPort::sample().with_intraday_error("429 Too Many Requests");
    let report = run_analysis(&port, &request(true), sample_today(), &options())
        .await
        .unwrap();

    assert!(report.success);
    assert!(report.intraday.is_none());
    let msg = report.intraday_error.as_deref().unwrap();
    assert!(msg.starts_with("intraday data unavailable"));
    assert!(msg.contains("429"));
    assert_eq!(report.daily.summary.sessions, 3);
    assert!(report.data.iter().all(|p| p.ret_15.is_none()));
}

#[tokio::test]
async fn daily_failure_is_an_error() {
    let port = MockBarPort::sample().with_daily_error("connection refused");
    let err = run_analysis(&port, &request(true), sample_today(), &options())
        .await
        .unwrap_err();
    assert!(matches!(err, GapError::Upstream { .. }));
    assert!(port.intraday_dates().is_empty());
}

#[tokio::test]
async fn too_few_bars_yields_failure_report() {
    let port = MockBarPort::new().with_daily(vec![daily_bar("2024-03-07", 1.0, 1.0, 1.0, 1.0)]);
    let report = run_analysis(&port, &request(true), sample_today(), &options())
        .await
        .unwrap();

    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some(NOT_ENOUGH_DATA));
    assert!(report.data.is_empty());
    assert_eq!(report.daily.summary.sessions, 0);
    assert_eq!(report.daily.bins.len(), 4);
    assert!(port.intraday_dates().is_empty());
}

#[tokio::test]
async fn no_qualifying_gaps_skips_intraday() {
    let bars = vec![
        daily_bar("2024-03-04", 100.0, 101.0, 99.0, 100.0),
        daily_bar("2024-03-05", 100.1, 101.0, 99.0, 100.5),
        daily_bar("2024-03-06", 100.4, 101.0, 99.0, 100.0),
    ];
    let port = MockBarPort::new().with_daily(bars);
    let report = run_analysis(&port, &request(true), sample_today(), &options())
        .await
        .unwrap();

    assert!(report.success);
    assert!(report.data.is_empty());
    assert_eq!(report.daily.summary.sessions, 0);
    assert_eq!(report.daily.summary.continuation_rate, 0.0);
    assert_eq!(report.daily.summary.best_strategy, Recommendation::Neutral);
    assert!(port.intraday_dates().is_empty());
}

#[tokio::test]
async fn session_cap_keeps_most_recent_dates() {
    let port = MockBarPort::sample();
    let opts = IntradayOptions {
        max_sessions: 2,
        ..options()
    };
    run_analysis(&port, &request(true), sample_today(), &opts)
        .await
        .unwrap();
    assert_eq!(
        port.intraday_dates(),
        vec![date("2024-03-06"), date("2024-03-07")]
    );
}

#[tokio::test]
async fn higher_threshold_narrows_sessions() {
    let port = MockBarPort::sample();
    let req = AnalysisRequest::new("SPY", 1, 0.8, false).unwrap();
    let report = run_analysis(&port, &req, sample_today(), &options())
        .await
        .unwrap();

    assert_eq!(report.daily.summary.sessions, 2);
    assert_eq!(report.min_gap, 0.8);
    assert_eq!(report.daily.bins[0].count, 0);
    assert_eq!(report.daily.bins[1].count, 1);
    assert_eq!(report.daily.bins[2].count, 1);
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let port = MockBarPort::sample();
    let a = run_analysis(&port, &request(true), sample_today(), &options())
        .await
        .unwrap();
    let b = run_analysis(&port, &request(true), sample_today(), &options())
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&a).unwrap(),
        serde_json::to_value(&b).unwrap()
    );
}

#[tokio::test]
async fn report_json_shape() {
    let port = MockBarPort::sample();
    let report = run_analysis(&port, &request(true), sample_today(), &options())
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["ticker"], "SPY");
    assert!(json.get("error").is_none());
    assert!(json["summary"].is_object());
    assert!(json["bins"].is_array());
    assert!(json["gap_up"].is_object());
    assert_eq!(json["summary"]["best_strategy"], "FOLLOW");
    assert_eq!(json["data"][0]["date"], "2024-03-04");
    assert_eq!(json["data"][0]["dow"], "Mon");
    assert_eq!(json["data"][0]["direction"], 1);
    assert!(json["data"][2].get("ret_15").is_none());
    assert_eq!(json["intraday"]["sessions"], 2);
    assert!(json["intraday"]["summary"].is_object());

    let days: Vec<&String> = json["by_dow"].as_object().unwrap().keys().collect();
    assert_eq!(days.len(), 5);
}
