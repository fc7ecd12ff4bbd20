//! Application configuration.
//!
//! Resolved once at start-up, in precedence order: command-line flags, then
//! environment (`POLYGON_API_KEY`, `PORT`, usually from `.env`), then the INI
//! file, then defaults. The resulting [`AppConfig`] is passed explicitly to the
//! boundary layers; the analysis core never reads process state.

use std::time::Duration;

use crate::adapters::polygon_adapter::DEFAULT_BASE_URL;
use crate::domain::analysis::{DEFAULT_YEARS, IntradayOptions, MAX_YEARS, MIN_YEARS};
use crate::domain::error::GapError;
use crate::domain::gap_event::GapThreshold;
use crate::ports::bar_port::Resolution;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const API_KEY_ENV: &str = "POLYGON_API_KEY";
pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisDefaults {
    pub years: u32,
    pub min_gap: GapThreshold,
    pub intraday: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub port: u16,
    pub open_browser: bool,
    pub request_timeout: Duration,
    pub defaults: AnalysisDefaults,
    pub intraday: IntradayOptions,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub port: Option<u16>,
    pub no_browser: bool,
}

impl AppConfig {
    /// Resolves the configuration from `file` (optional INI), `env` and
    /// command-line `overrides`.
    pub fn resolve<E>(
        file: Option<&dyn ConfigPort>,
        env: E,
        overrides: &Overrides,
    ) -> Result<Self, GapError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let file_string = |section: &str, key: &str| file.and_then(|f| f.get_string(section, key));
        let non_empty = |v: String| {
            let v = v.trim().to_string();
            (!v.is_empty()).then_some(v)
        };

        let api_key = overrides
            .api_key
            .clone()
            .and_then(non_empty)
            .or_else(|| env(API_KEY_ENV).and_then(non_empty))
            .or_else(|| file_string("polygon", "api_key"))
            .ok_or_else(|| GapError::ConfigMissing {
                section: "polygon".into(),
                key: "api_key".into(),
            })?;

        let base_url =
            file_string("polygon", "base_url").unwrap_or_else(|| DEFAULT_BASE_URL.into());

        let port = match overrides.port {
            Some(p) => p,
            None => match env(PORT_ENV).and_then(non_empty) {
                Some(raw) => raw.parse::<u16>().map_err(|_| {
                    invalid("server", "port", format!("PORT '{raw}' is not a valid port"))
                })?,
                None => int_in_range(
                    file,
                    "server",
                    "port",
                    i64::from(DEFAULT_PORT),
                    1,
                    i64::from(u16::MAX),
                )? as u16,
            },
        };
        if port == 0 {
            return Err(invalid("server", "port", "port must be non-zero".into()));
        }

        let open_browser = !overrides.no_browser
            && file.is_none_or(|f| f.get_bool("server", "open_browser", true));

        let timeout_secs = int_in_range(
            file,
            "server",
            "request_timeout_secs",
            DEFAULT_REQUEST_TIMEOUT_SECS as i64,
            1,
            3_600,
        )?;

        let years = int_in_range(
            file,
            "analysis",
            "default_years",
            i64::from(DEFAULT_YEARS),
            i64::from(MIN_YEARS),
            i64::from(MAX_YEARS),
        )? as u32;

        let min_gap = match file {
            Some(f) => GapThreshold::new(f.get_double(
                "analysis",
                "default_min_gap",
                GapThreshold::DEFAULT.value(),
            ))
            .map_err(|e| invalid("analysis", "default_min_gap", e.to_string()))?,
            None => GapThreshold::DEFAULT,
        };

        let intraday_defaults = IntradayOptions::default();
        let resolution = match file_string("analysis", "intraday_resolution") {
            Some(raw) => {
                let resolution: Resolution = raw
                    .parse()
                    .map_err(|e: GapError| invalid("analysis", "intraday_resolution", e.to_string()))?;
                if resolution == Resolution::Day {
                    return Err(invalid(
                        "analysis",
                        "intraday_resolution",
                        "must be minute or 15minute".into(),
                    ));
                }
                resolution
            }
            None => intraday_defaults.resolution,
        };

        let pacing_ms = int_in_range(
            file,
            "analysis",
            "intraday_pacing_ms",
            intraday_defaults.pacing.as_millis() as i64,
            0,
            60_000,
        )?;
        let max_sessions = int_in_range(
            file,
            "analysis",
            "intraday_max_sessions",
            intraday_defaults.max_sessions as i64,
            1,
            10_000,
        )?;

        Ok(AppConfig {
            api_key,
            base_url,
            port,
            open_browser,
            request_timeout: Duration::from_secs(timeout_secs as u64),
            defaults: AnalysisDefaults {
                years,
                min_gap,
                intraday: file.is_some_and(|f| f.get_bool("analysis", "intraday", false)),
            },
            intraday: IntradayOptions {
                resolution,
                pacing: Duration::from_millis(pacing_ms as u64),
                max_sessions: max_sessions as usize,
            },
        })
    }

    /// Resolves against the real process environment.
    pub fn from_env(file: Option<&dyn ConfigPort>, overrides: &Overrides) -> Result<Self, GapError> {
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }
}

fn invalid(section: &str, key: &str, reason: String) -> GapError {
    GapError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn int_in_range(
    file: Option<&dyn ConfigPort>,
    section: &str,
    key: &str,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64, GapError> {
    let value = file.map_or(default, |f| f.get_int(section, key, default));
    if value < min || value > max {
        return Err(invalid(
            section,
            key,
            format!("{key} must be between {min} and {max}, got {value}"),
        ));
    }
    Ok(value)
}
