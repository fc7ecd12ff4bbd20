//! HTTP request handlers for the web adapter.

use axum::{
    Json,
    extract::{Query, State},
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::domain::analysis::{AnalysisRequest, run_analysis};
use crate::domain::error::GapError;
use crate::domain::report::GapReport;

use super::{AppState, DASHBOARD_HTML, WebError};

pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn not_found() -> WebError {
    WebError::not_found("not found")
}

/// Raw `/api/gaps` query. Fields are parsed by hand so malformed values get
/// a descriptive 400 instead of a generic extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct GapQuery {
    pub ticker: Option<String>,
    pub years: Option<String>,
    #[serde(rename = "minGap", alias = "min_gap")]
    pub min_gap: Option<String>,
    pub intraday: Option<String>,
}

impl GapQuery {
    pub fn into_request(self, state: &AppState) -> Result<AnalysisRequest, GapError> {
        let defaults = &state.config.defaults;

        let years = match present(&self.years) {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                GapError::invalid_parameter("years", format!("'{raw}' is not a whole number"))
            })?,
            None => defaults.years,
        };
        let min_gap = match present(&self.min_gap) {
            Some(raw) => raw.parse::<f64>().map_err(|_| {
                GapError::invalid_parameter("minGap", format!("'{raw}' is not a number"))
            })?,
            None => defaults.min_gap.value(),
        };
        let intraday = match present(&self.intraday) {
            Some(raw) => parse_flag(raw)
                .ok_or_else(|| GapError::invalid_parameter("intraday", format!("'{raw}' is not a boolean")))?,
            None => defaults.intraday,
        };

        AnalysisRequest::new(self.ticker.as_deref().unwrap_or(""), years, min_gap, intraday)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GapQuery>,
) -> Result<impl IntoResponse, WebError> {
    let request = query.into_request(&state)?;
    let today = (state.today)();

    let report: GapReport = run_analysis(
        state.bar_port.as_ref(),
        &request,
        today,
        &state.config.intraday,
    )
    .await?;

    info!(
        ticker = %report.ticker,
        success = report.success,
        sessions = report.daily.summary.sessions,
        "analysis served"
    );
    Ok(Json(report))
}
