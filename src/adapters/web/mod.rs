//! Web server adapter.
//!
//! Axum router serving the embedded dashboard at `/` and the JSON analysis
//! endpoint at `/api/gaps`.

mod error;
mod handlers;

pub use error::{WebError, status_from_error};
pub use handlers::*;

use axum::{Router, routing::get};
use chrono::NaiveDate;
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::ports::bar_port::BarPort;

/// Single-page dashboard served at `/`.
pub const DASHBOARD_HTML: &str = include_str!("dashboard.html");

pub struct AppState {
    pub bar_port: Arc<dyn BarPort>,
    pub config: Arc<AppConfig>,
    /// End date of every lookback window.
    pub today: fn() -> NaiveDate,
}

pub fn build_router(state: AppState) -> Router {
    let timeout = state.config.request_timeout;
    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/healthz", get(handlers::healthz))
        .route("/api/gaps", get(handlers::analyze))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
}
