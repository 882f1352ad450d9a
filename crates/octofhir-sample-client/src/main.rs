use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use octofhir_sample_client::cli::Cli;
use octofhir_sample_client::names::load_names;
use octofhir_sample_client::observability::init_tracing;
use octofhir_sample_client::output::{print_error, print_pass_report};
use octofhir_sample_client::{
    BatchPlan, BatchRunner, LoggingInterceptor, Presenter, ResponseTimeInterceptor, SampleConfig,
    SearchClient,
};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = SampleConfig::resolve(&cli).context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    let names = load_names(config.names_path())?;
    tracing::info!(count = names.len(), server = %config.server, "starting batch");

    let stats = Arc::new(ResponseTimeInterceptor::new());
    let mut builder = SearchClient::builder(&config.server)
        .interceptor(Arc::new(LoggingInterceptor))
        .interceptor(stats.clone());
    if let Some(timeout) = config.timeout() {
        builder = builder.timeout(timeout);
    }
    let client = Arc::new(builder.build().context("Failed to create FHIR client")?);

    let plan = BatchPlan::with_passes(config.passes).stat_scope(config.stat_scope);
    let mut runner = BatchRunner::new(client, stats, names, plan);
    if config.print_patients {
        runner = runner.with_presenter(Presenter::new(config.format));
    }

    runner.run(print_pass_report).await?;
    Ok(())
}
