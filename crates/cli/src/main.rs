use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flatscore_core::domain::contract::{RecommendRequest, RecommendResponse, YearPrediction};
use flatscore_core::domain::unit::{FlatModel, FlatType, Town};
use flatscore_core::engine::service::RecommendationService;
use flatscore_core::engine::EngineOptions;
use flatscore_core::oracle::{projection, UnitDescription};
use flatscore_core::time::horizon;

#[derive(Debug, Parser)]
#[command(name = "flatscore")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank units for a criteria file (the JSON body of POST /recommend).
    Recommend {
        #[arg(long)]
        criteria: PathBuf,

        /// Used when the criteria file has no `targetYear`. Defaults to next calendar year.
        #[arg(long)]
        target_year: Option<String>,

        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Price trajectory of one unit.
    Project {
        #[arg(long)]
        town: String,

        #[arg(long)]
        flat_type: String,

        #[arg(long, default_value = "Model A")]
        flat_model: String,

        #[arg(long)]
        floor_area: f64,

        #[arg(long, default_value_t = 7)]
        floor_level: u8,

        #[arg(long)]
        lease_commence_year: i32,

        /// Comma separated. Defaults to every year from next calendar year to 2030.
        #[arg(long, value_delimiter = ',')]
        years: Vec<i32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = flatscore_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(args.command, &settings).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "flatscore run failed");
    }
    result
}

async fn run(command: Command, settings: &flatscore_core::config::Settings) -> anyhow::Result<()> {
    let mut options = EngineOptions::from_env();

    match command {
        Command::Recommend {
            criteria,
            target_year,
            top_k,
        } => {
            if let Some(k) = top_k {
                options = options.with_top_k(k);
            }
            let service = RecommendationService::from_settings(settings, options)?;
            let request = read_request(&criteria, target_year.as_deref())?;

            let criteria = request.validate_and_into_criteria(service.catalog())?;
            let set = service.recommend(&criteria).await?;

            tracing::info!(
                total_candidates = set.total_candidates,
                returned = set.recommendations.len(),
                "recommend finished"
            );
            print_json(&RecommendResponse::from(&set))
        }
        Command::Project {
            town,
            flat_type,
            flat_model,
            floor_area,
            floor_level,
            lease_commence_year,
            years,
        } => {
            let service = RecommendationService::from_settings(settings, options)?;
            let unit = UnitDescription {
                town: Town::parse(&town).with_context(|| format!("unknown town {town:?}"))?,
                flat_type: FlatType::parse(&flat_type)
                    .with_context(|| format!("unknown flat type {flat_type:?}"))?,
                flat_model: FlatModel::parse(&flat_model)
                    .with_context(|| format!("unknown flat model {flat_model:?}"))?,
                floor_area_sqm: floor_area,
                floor_level,
                lease_commence_year,
            };
            unit.validate()?;

            let years = if years.is_empty() {
                horizon::trajectory_years(horizon::resolve_target_year(None, chrono::Utc::now())?)
            } else {
                years
            };

            let trajectory = projection::project(service.oracle(), &unit, &years).await?;
            let out: Vec<YearPrediction> = trajectory.iter().map(YearPrediction::from).collect();
            print_json(&out)
        }
    }
}

/// Reads a recommend request, filling `targetYear` when the file leaves it out.
fn read_request(path: &Path, target_year: Option<&str>) -> anyhow::Result<RecommendRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read criteria file {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parse criteria file {}", path.display()))?;

    let object = value
        .as_object_mut()
        .context("criteria file must contain a JSON object")?;
    if !object.contains_key("targetYear") {
        let year = horizon::resolve_target_year(target_year, chrono::Utc::now())?;
        object.insert("targetYear".to_string(), serde_json::json!(year));
    }

    serde_json::from_value(value).context("criteria file does not match the recommend request")
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_sentry(settings: &flatscore_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
