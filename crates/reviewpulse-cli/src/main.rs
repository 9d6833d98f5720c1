mod args;
mod pipeline;

use std::sync::Arc;

use anyhow::Context;
use arrow::util::pretty::pretty_format_batches;
use clap::Parser;
use dialoguer::MultiSelect;
use dialoguer::theme::ColorfulTheme;
use reviewpulse_ai::{Extractor, GeminiClient, Throttle};
use reviewpulse_core::{CityFilter, ConfigLayer, RunConfig, records_to_batch};
use reviewpulse_places::PlacesClient;
use reviewpulse_store::{load_places, write_report};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before parsing, so .env values can fill env-backed flags.
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!("reviewpulse v{}", env!("CARGO_PKG_VERSION"));

    let file_layer = match &args.config {
        Some(path) => ConfigLayer::load(path)?,
        None => ConfigLayer::default(),
    };
    let config = args.layer().or(file_layer).resolve()?;

    let place_list = load_places(&config.input)
        .with_context(|| format!("loading place list {}", config.input.display()))?;

    let cities = if args.interactive && config.cities.is_all() {
        CityFilter::from_names(prompt_cities(&place_list.cities())?)
    } else {
        config.cities.clone()
    };
    let config = RunConfig { cities, ..config };
    info!(config = ?config, "configuration resolved");

    let places = place_list.filter(&config.cities);
    if places.is_empty() {
        warn!(cities = %config.cities, "no places match the city filter");
    } else {
        info!(places = places.len(), cities = %config.cities, "places selected");
    }

    let source = PlacesClient::new(config.places_api_key.clone(), config.request_timeout)?;
    let model = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.model.clone(),
        config.request_timeout,
    )?;
    let throttle = Throttle::new(config.batch_delay);
    info!(
        model = model.model(),
        throttled = throttle.is_limited(),
        batch_delay_ms = config.batch_delay.as_millis() as u64,
        "model client ready"
    );
    let extractor = Extractor::new(Arc::new(model), throttle, config.request_timeout);
    let pipeline = Pipeline::new(
        Arc::new(source),
        extractor,
        config.batch_size,
        config.concurrency,
    );

    let (records, stats) = pipeline.run(&places).await;
    stats.log();
    if records.is_empty() {
        warn!("no reviews were analysed; writing an empty report");
    }

    let batch = records_to_batch(&records).context("building report table")?;
    write_report(&config.output, &batch, config.format)
        .with_context(|| format!("writing report {}", config.output.display()))?;

    if args.preview > 0 && batch.num_rows() > 0 {
        let head = batch.slice(0, args.preview.min(batch.num_rows()));
        println!("{}", pretty_format_batches(&[head])?);
    }
    println!(
        "Wrote {} rows to {}",
        batch.num_rows(),
        config.output.display()
    );
    Ok(())
}

/// Let the user pick cities. Selecting none means all cities.
fn prompt_cities(available: &[String]) -> anyhow::Result<Vec<String>> {
    if available.is_empty() {
        return Ok(Vec::new());
    }
    let selected = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Cities to analyse (space toggles, enter confirms, none selects all)")
        .items(available)
        .interact()?;
    Ok(selected.into_iter().map(|i| available[i].clone()).collect())
}
