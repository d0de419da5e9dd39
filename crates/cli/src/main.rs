//! `gradeflow` entry point.
//!
//! This binary is the composition root:
//!
//! 1. Install the tracing subscriber (and the OTLP exporter when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set).
//! 2. Read the oracle configuration from the environment.
//! 3. Build the chosen workflow over a [`llm::ChatCompletionsOracle`] and run
//!    it on each input document.

mod cli;
mod observability;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let telemetry = observability::init(cli.log_format())?;

    let result = cli.run().await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "gradeflow failed");
    }

    telemetry.shutdown();
    result
}
