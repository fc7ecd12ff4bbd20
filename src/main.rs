use clap::Parser;
use gapscope::cli::{Cli, run};
use tracing_subscriber::prelude::*;

fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    // stdout carries the `analyze` report; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse())
}
