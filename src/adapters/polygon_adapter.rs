//! Polygon.io aggregates adapter implementing [`BarPort`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::bar::Bar;
use crate::domain::error::GapError;
use crate::ports::bar_port::{BarPort, Resolution};

pub const DEFAULT_BASE_URL: &str = "https://api.polygon.io";

/// Largest page the aggregates endpoint serves.
const PAGE_LIMIT: u32 = 50_000;

/// Guard against a provider that keeps handing out `next_url`s.
const MAX_PAGES: usize = 100;

#[derive(Debug, Deserialize)]
struct AggregateBar {
    /// Interval start, Unix milliseconds.
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    #[serde(default)]
    v: f64,
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    results: Vec<AggregateBar>,
    #[serde(default)]
    next_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AggregatesResponse {
    fn provider_error(&self) -> Option<String> {
        match self.status.as_deref() {
            Some("ERROR") | Some("NOT_AUTHORIZED") | Some("NOT_FOUND") => Some(
                self.error
                    .clone()
                    .or_else(|| self.message.clone())
                    .unwrap_or_else(|| "request rejected".to_string()),
            ),
            _ => None,
        }
    }
}

pub struct PolygonAdapter {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PolygonAdapter {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, GapError> {
        let client = Client::builder()
            .user_agent(concat!("gapscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GapError::upstream(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn aggregates_url(
        &self,
        ticker: &str,
        resolution: Resolution,
        from: NaiveDate,
        to: NaiveDate,
    ) -> String {
        let (multiplier, timespan) = resolution.span();
        format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url,
            ticker,
            multiplier,
            timespan,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
        )
    }

    async fn get_page(&self, url: &str, first: bool) -> Result<AggregatesResponse, GapError> {
        let mut request = self.client.get(url);
        if first {
            request = request.query(&[
                ("adjusted", "false".to_string()),
                ("sort", "asc".to_string()),
                ("limit", PAGE_LIMIT.to_string()),
            ]);
        }
        let response = request
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GapError::upstream(format!("polygon request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GapError::upstream(format!("polygon: {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GapError::upstream(format!("polygon body read failed: {}", e.without_url())))?;
        parse_aggregates(&body)
    }
}

fn parse_aggregates(body: &str) -> Result<AggregatesResponse, GapError> {
    let parsed: AggregatesResponse = serde_json::from_str(body).map_err(|e| GapError::Decode {
        reason: e.to_string(),
    })?;
    if let Some(reason) = parsed.provider_error() {
        return Err(GapError::upstream(format!("polygon: {reason}")));
    }
    Ok(parsed)
}

fn to_bars(raw: Vec<AggregateBar>) -> Vec<Bar> {
    let mut bars: Vec<Bar> = raw
        .into_iter()
        .filter_map(|b| {
            let Some(timestamp) = DateTime::<Utc>::from_timestamp_millis(b.t) else {
                warn!(t = b.t, "dropping bar with out-of-range timestamp");
                return None;
            };
            Some(Bar {
                timestamp,
                open: b.o,
                high: b.h,
                low: b.l,
                close: b.c,
                volume: b.v,
            })
        })
        .collect();
    // Downstream passes rely on strictly ascending, unique timestamps.
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}

#[async_trait]
impl BarPort for PolygonAdapter {
    async fn fetch_bars(
        &self,
        ticker: &str,
        resolution: Resolution,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, GapError> {
        let mut url = self.aggregates_url(ticker, resolution, from, to);
        let mut raw = Vec::new();

        for page in 0..MAX_PAGES {
            let response = self.get_page(&url, page == 0).await?;
            debug!(
                ticker,
                ?resolution,
                page,
                results = response.results.len(),
                "polygon aggregates page"
            );
            raw.extend(response.results);
            match response.next_url {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        Ok(to_bars(raw))
    }
}
