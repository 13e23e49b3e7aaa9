use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use turbine_relay::config::load_or_default;
use turbine_relay::kpi::{Kpi, KpiFilter};
use turbine_relay::observability::logging;
use turbine_relay::store::MongoStore;
use turbine_relay::units::aggregator::query_kpi;

#[derive(Parser)]
#[command(name = "kpi-report")]
#[command(about = "Run the turbine KPIs once against the store", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Restrict every KPI to one turbine.
    #[arg(short, long)]
    source: Option<String>,

    /// Which KPI to run.
    #[arg(short, long, value_enum, default_value_t = Selection::All)]
    kpi: Selection,
}

#[derive(Clone, Copy, ValueEnum)]
enum Selection {
    All,
    Wind,
    Efficiency,
    Daily,
    Total,
}

impl Selection {
    fn kpis(self) -> Vec<Kpi> {
        match self {
            Selection::All => Kpi::ALL.to_vec(),
            Selection::Wind => vec![Kpi::MeanWindSpeed],
            Selection::Efficiency => vec![Kpi::ProductionEfficiency],
            Selection::Daily => vec![Kpi::DailyEnergy],
            Selection::Total => vec![Kpi::TotalEnergy],
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    logging::init(&config.observability)?;

    let store = MongoStore::connect(&config.store).await?;
    let filter = KpiFilter {
        source_id: cli.source.or(config.aggregator.source_id),
    };

    let mut failures = 0;
    for kpi in cli.kpi.kpis() {
        match query_kpi(&store, kpi, &filter, config.aggregator.daily_limit).await {
            Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
            Err(e) => {
                eprintln!("Error: {} failed: {}", kpi.name(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} KPI queries failed", failures).into());
    }
    Ok(())
}
