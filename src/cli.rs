//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::polygon_adapter::PolygonAdapter;
use crate::config::{AppConfig, Overrides};
use crate::domain::analysis::{AnalysisRequest, run_analysis};
use crate::domain::bar::exchange_today;
use crate::domain::error::GapError;
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "gapscope", about = "Opening-gap statistics for US equities")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web dashboard and JSON API
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Polygon.io API key (overrides environment and config file)
        #[arg(long)]
        apikey: Option<String>,
        /// HTTP port (overrides environment and config file)
        #[arg(short, long)]
        port: Option<u16>,
        /// Do not open a browser once the server is listening
        #[arg(long)]
        no_browser: bool,
    },
    /// Run one analysis and print the JSON report
    Analyze {
        #[arg(short, long)]
        ticker: String,
        /// Lookback in years (1-5)
        #[arg(short, long)]
        years: Option<u32>,
        /// Minimum absolute gap in percent (0 < x < 20)
        #[arg(short = 'g', long)]
        min_gap: Option<f64>,
        /// Also compute the 09:30-09:45 overlay
        #[arg(long)]
        intraday: bool,
        /// Skip the overlay even when the config file enables it
        #[arg(long, conflicts_with = "intraday")]
        no_intraday: bool,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        apikey: Option<String>,
    },
    /// Resolve and validate the configuration without contacting the provider
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        apikey: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve {
            config,
            apikey,
            port,
            no_browser,
        } => {
            let overrides = Overrides {
                api_key: apikey,
                port,
                no_browser,
            };
            match load_app_config(config.as_ref(), &overrides) {
                Ok(cfg) => run_serve(cfg),
                Err(code) => code,
            }
        }
        Command::Analyze {
            ticker,
            years,
            min_gap,
            intraday,
            no_intraday,
            config,
            apikey,
        } => {
            let overrides = Overrides {
                api_key: apikey,
                ..Overrides::default()
            };
            let intraday = match (intraday, no_intraday) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            match load_app_config(config.as_ref(), &overrides) {
                Ok(cfg) => run_analyze(&cfg, &ticker, years, min_gap, intraday),
                Err(code) => code,
            }
        }
        Command::Check { config, apikey } => {
            let overrides = Overrides {
                api_key: apikey,
                ..Overrides::default()
            };
            match load_app_config(config.as_ref(), &overrides) {
                Ok(cfg) => run_check(&cfg),
                Err(code) => code,
            }
        }
    }
}

fn fail(err: &GapError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

/// Loads the optional INI file and resolves the full configuration against
/// the process environment.
pub fn load_app_config(
    path: Option<&PathBuf>,
    overrides: &Overrides,
) -> Result<AppConfig, ExitCode> {
    let file = match path {
        Some(p) => {
            info!(path = %p.display(), "loading config");
            Some(FileConfigAdapter::from_file(p).map_err(|e| fail(&e))?)
        }
        None => None,
    };
    AppConfig::from_env(
        file.as_ref().map(|f| f as &dyn ConfigPort),
        overrides,
    )
    .map_err(|e| fail(&e))
}

fn runtime() -> Result<tokio::runtime::Runtime, ExitCode> {
    tokio::runtime::Runtime::new().map_err(|e| fail(&GapError::Io(e)))
}

/// Builds the request for `analyze`, falling back to configured defaults for
/// anything not given on the command line.
pub fn build_request(
    cfg: &AppConfig,
    ticker: &str,
    years: Option<u32>,
    min_gap: Option<f64>,
    intraday: Option<bool>,
) -> Result<AnalysisRequest, GapError> {
    AnalysisRequest::new(
        ticker,
        years.unwrap_or(cfg.defaults.years),
        min_gap.unwrap_or(cfg.defaults.min_gap.value()),
        intraday.unwrap_or(cfg.defaults.intraday),
    )
}

fn run_analyze(
    cfg: &AppConfig,
    ticker: &str,
    years: Option<u32>,
    min_gap: Option<f64>,
    intraday: Option<bool>,
) -> ExitCode {
    let request = match build_request(cfg, ticker, years, min_gap, intraday) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    let adapter = match PolygonAdapter::new(cfg.api_key.clone(), cfg.base_url.clone()) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let today = exchange_today();
    let report = match rt.block_on(run_analysis(&adapter, &request, today, &cfg.intraday)) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => return fail(&GapError::Io(e.into())),
    }

    if let Some(msg) = &report.intraday_error {
        eprintln!("warning: {msg}");
    }
    if report.success {
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "error: {}",
            report.error.as_deref().unwrap_or("analysis failed")
        );
        ExitCode::from(5)
    }
}

fn run_check(cfg: &AppConfig) -> ExitCode {
    eprintln!("Configuration valid");
    eprintln!("  base_url:        {}", cfg.base_url);
    eprintln!("  port:            {}", cfg.port);
    eprintln!("  open_browser:    {}", cfg.open_browser);
    eprintln!("  request_timeout: {}s", cfg.request_timeout.as_secs());
    eprintln!("  default_years:   {}", cfg.defaults.years);
    eprintln!("  default_min_gap: {}", cfg.defaults.min_gap.value());
    eprintln!("  intraday:        {}", cfg.defaults.intraday);
    eprintln!(
        "  intraday_source: {:?}, pacing {}ms, max {} sessions",
        cfg.intraday.resolution,
        cfg.intraday.pacing.as_millis(),
        cfg.intraday.max_sessions
    );
    ExitCode::SUCCESS
}

#[cfg(feature = "web")]
fn run_serve(cfg: AppConfig) -> ExitCode {
    use crate::adapters::web::{AppState, build_router};
    use std::sync::Arc;

    let adapter = match PolygonAdapter::new(cfg.api_key.clone(), cfg.base_url.clone()) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };
    let rt = match runtime() {
        Ok(rt) => rt,
        Err(code) => return code,
    };

    let port = cfg.port;
    let open_browser = cfg.open_browser;
    let router = build_router(AppState {
        bar_port: Arc::new(adapter),
        config: Arc::new(cfg),
        today: exchange_today,
    });

    let result: Result<(), GapError> = rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
        let url = format!("http://localhost:{port}");
        info!("gap analyzer running on {url}");

        if open_browser {
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                crate::adapters::browser::open_browser(&url);
            });
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown signal received");
            })
            .await?;
        Ok(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

#[cfg(not(feature = "web"))]
fn run_serve(_cfg: AppConfig) -> ExitCode {
    eprintln!("error: gapscope was built without the `web` feature");
    ExitCode::from(1)
}
