use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nutrition_engine::config::EngineConfig;
use nutrition_engine::ingredient_model::MealNutritionResult;
use nutrition_engine::resolver::NutritionResolver;
use nutrition_engine::targets::{AgeBand, NutrientTargets, TargetProgress};

#[derive(Parser)]
#[command(
    name = "nutrition-engine",
    about = "Resolve meal descriptions into nutrient breakdowns"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a meal description (e.g. "Arroz: 60g, Feijão: 50g")
    Resolve {
        text: String,
        /// Compare totals with the daily targets of an age band (infant, toddler, child)
        #[arg(long)]
        band: Option<AgeBand>,
    },
    /// Rank composition records against a food name
    Search { query: String },
    /// Show one composition record
    Detail { id: u32 },
}

#[derive(Serialize)]
struct ResolveOutput {
    #[serde(flatten)]
    result: MealNutritionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    targets: Option<Vec<TargetProgress>>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = EngineConfig::from_env().context("Invalid NUTRITION_* configuration")?;
    let resolver = NutritionResolver::from_config(&config)?;
    info!("Nutrition engine ready");

    match cli.command {
        Command::Resolve { text, band } => {
            let result = resolver.resolve(&text).await?;
            let targets = band.and_then(|band| {
                let totals = result.totals.as_ref()?;
                Some(NutrientTargets::for_band(band).compare(totals))
            });
            print_json(&ResolveOutput { result, targets })
        }
        Command::Search { query } => {
            let records = resolver
                .search(&query)
                .await
                .context("Composition table unavailable")?;
            print_json(&records)
        }
        Command::Detail { id } => match resolver.record_detail(id).await? {
            Some(record) => print_json(&record),
            None => anyhow::bail!("No composition record with id {id}"),
        },
    }
}
