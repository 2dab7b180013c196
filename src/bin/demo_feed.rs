//! Demo feed for suivi-rendement.
//!
//! Generates plausible weigh-in records (and the occasional incident) and
//! posts them to the hosted backend, so a test deployment has data to chart.
//!
//! # Usage
//! ```bash
//! ./demo-feed --url https://xyz.supabase.co --api-key $KEY --records 60
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use suivi_rendement::backend::{NewIncident, NewWeighRecord, RecordsSource, RestBackend};
use suivi_rendement::config::BackendConfig;
use suivi_rendement::types::{IncidentKind, IncidentSeverity, Line};

/// Mean throughput of the synthetic workforce (kg/h).
const BASE_THROUGHPUT: f64 = 4.2;
/// Spread of individual throughput samples (kg/h).
const THROUGHPUT_SPREAD: f64 = 0.6;

const BREAKDOWN_DESCRIPTIONS: &[&str] = &[
    "arrêt convoyeur ligne",
    "bourrage trieuse",
    "panne balance",
    "surchauffe moteur tapis",
];

const ERROR_DESCRIPTIONS: &[&str] = &[
    "erreur de saisie poids",
    "lot mal étiqueté",
    "caisse non conforme",
];

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "demo-feed")]
#[command(about = "Synthetic weigh-in feed for suivi-rendement testing")]
#[command(version)]
struct Args {
    /// Hosted backend base URL
    #[arg(long, env = "SUIVI_BACKEND_URL")]
    url: String,

    /// Backend API key
    #[arg(long, env = "SUIVI_BACKEND_KEY")]
    api_key: String,

    /// Number of distinct workers to simulate
    #[arg(long, default_value = "8", value_parser = clap::value_parser!(u32).range(1..=99))]
    workers: u32,

    /// Number of weigh records to insert
    #[arg(long, default_value = "40")]
    records: u32,

    /// Probability of an incident following each weigh-in
    #[arg(long, default_value = "0.08")]
    incident_chance: f64,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let backend = RestBackend::from_config(&BackendConfig {
        url: args.url.clone(),
        api_key: args.api_key.clone(),
        ..BackendConfig::default()
    })
    .context("failed to build backend client")?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let throughput_dist = Normal::new(BASE_THROUGHPUT, THROUGHPUT_SPREAD)
        .context("invalid throughput distribution")?;

    let mut inserted_records = 0u32;
    let mut inserted_incidents = 0u32;

    for _ in 0..args.records {
        let worker_id = format!("OP-{:02}", rng.gen_range(1..=args.workers));
        let line = if rng.gen_bool(0.5) { Line::One } else { Line::Two };
        let duration_minutes = rng.gen_range(180..=480);

        // Sample a throughput, then derive the weight the scale would show.
        let kg_per_hour = throughput_dist.sample(&mut rng).max(1.0);
        let weight_kg = kg_per_hour * f64::from(duration_minutes) / 60.0;

        backend
            .insert_weigh_record(&NewWeighRecord {
                worker_id: worker_id.clone(),
                line,
                weight_kg: (weight_kg * 1000.0).round() / 1000.0,
                duration_minutes,
            })
            .await
            .with_context(|| format!("failed to insert weigh record for {worker_id}"))?;
        inserted_records += 1;

        if rng.gen_bool(args.incident_chance) {
            let kind = if rng.gen_bool(0.5) {
                IncidentKind::Breakdown
            } else {
                IncidentKind::Error
            };
            let descriptions = match kind {
                IncidentKind::Breakdown => BREAKDOWN_DESCRIPTIONS,
                IncidentKind::Error => ERROR_DESCRIPTIONS,
            };
            let severity = match rng.gen_range(0..4) {
                0 => IncidentSeverity::Minor,
                1 => IncidentSeverity::Moderate,
                2 => IncidentSeverity::Severe,
                _ => IncidentSeverity::Critical,
            };
            backend
                .insert_incident(&NewIncident {
                    kind,
                    line,
                    severity,
                    description: descriptions[rng.gen_range(0..descriptions.len())].to_string(),
                    worker_id,
                })
                .await
                .context("failed to insert incident")?;
            inserted_incidents += 1;
        }
    }

    info!(
        records = inserted_records,
        incidents = inserted_incidents,
        "demo feed complete"
    );
    Ok(())
}
