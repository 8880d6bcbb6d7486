use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gesta_core::constants::{
    ENV_BATCH_FILE, ENV_BOOKINGS_FILE, ENV_CAPACITY_FILE, ENV_OUTPUT_FILE, ENV_RUN_DATE,
};
use gesta_core::record::read_batch_file;
use gesta_core::{run_batch, InMemoryBookingStore, RunConfig, SchedulingContext, YamlCapacityStore};

/// Main entry point for the batch scheduler
///
/// Runs one scheduling batch:
/// - loads the capacity table once into a `SchedulingContext`
/// - schedules every record of the batch file in order
/// - writes the decisions as JSON to `GESTA_OUTPUT_FILE` or stdout
///
/// # Environment Variables
/// - `GESTA_RUN_DATE`: run date as `YYYY-MM-DD` (default: today)
/// - `GESTA_CAPACITY_FILE`: capacity table (default: "config/capacity.yaml")
/// - `GESTA_BATCH_FILE`: patient records to schedule (required)
/// - `GESTA_BOOKINGS_FILE`: existing bookings (optional)
/// - `GESTA_OUTPUT_FILE`: where to write the JSON report (optional)
///
/// # Returns
/// * `Ok(())` - If the batch ran, even when individual records were not scheduled
/// * `Err(anyhow::Error)` - If configuration or input files cannot be loaded
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("gesta=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = RunConfig::from_env_values(
        std::env::var(ENV_RUN_DATE).ok(),
        std::env::var(ENV_CAPACITY_FILE).ok(),
        std::env::var(ENV_BATCH_FILE).ok(),
        std::env::var(ENV_BOOKINGS_FILE).ok(),
        std::env::var(ENV_OUTPUT_FILE).ok(),
        chrono::Local::now().date_naive(),
    )?;

    let capacity_store = YamlCapacityStore::new(cfg.capacity_file());
    let ctx = SchedulingContext::load(&capacity_store, cfg.run_date(), cfg.year_policy())
        .with_context(|| format!("loading capacity table {}", cfg.capacity_file().display()))?;

    let records = read_batch_file(cfg.batch_file())
        .with_context(|| format!("reading batch {}", cfg.batch_file().display()))?;

    let mut bookings = match cfg.bookings_file() {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading bookings {}", path.display()))?;
            InMemoryBookingStore::from_yaml(&contents)?
        }
        None => InMemoryBookingStore::default(),
    };

    let report = run_batch(&ctx, &records, &mut bookings);

    match cfg.output_file() {
        Some(path) => {
            report.write_json(path)?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => println!("{}", report.to_json()?),
    }

    if report.summary.pending_manual_review > 0 || report.summary.unscheduled > 0 {
        tracing::warn!(
            pending = report.summary.pending_manual_review,
            unscheduled = report.summary.unscheduled,
            "some records need manual follow-up"
        );
    }

    Ok(())
}
