//! Loads a broker CSV and a CFTC CSV, renders all six charts and writes them
//! as `dashboard.json`.
//!
//! ```text
//! cargo run --example compare -- <broker.csv> <cftc.csv> [out_dir]
//! ```
//!
//! The selection defaults to every year, entity and category found in the
//! data. Narrow it with `COTLENS_YEARS=2023,2024`, `COTLENS_ENTITIES=...`,
//! `COTLENS_CATEGORIES="Managed Money"` and `COTLENS_WINDOW=30`. A JSON
//! config can be passed via `COTLENS_CONFIG=path/to/config.json`, and
//! `COTLENS_LOG_DIR` redirects the JSON logs.

use std::{env, fs, path::PathBuf, time::Instant};

use anyhow::{Context, Result, bail};
use cotlens::prelude::*;
use time::macros::format_description;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{time::UtcTime, writer::BoxMakeWriter},
};

fn main() -> Result<()> {
    let _guard = init_tracing()?;

    let mut args = env::args().skip(1);
    let (Some(broker_path), Some(cftc_path)) = (args.next(), args.next()) else {
        bail!("usage: compare <broker.csv> <cftc.csv> [out_dir]");
    };
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/output"));

    let config = match env::var("COTLENS_CONFIG") {
        Ok(path) => DashboardConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        Err(_) => DashboardConfig::default(),
    };

    let load_start = Instant::now();
    let broker = config.broker_table(read_csv(&broker_path)?)?;
    let regulatory = config.regulatory_table(read_csv(&cftc_path)?)?;
    let load_time = load_start.elapsed();

    let selection = selection(&config, &broker, &regulatory)?;
    info!(?selection, "Rendering dashboard");

    let render_start = Instant::now();
    let dashboard = config.comparison(&broker, &regulatory).render(&selection)?;
    let render_time = render_start.elapsed();

    let path = dashboard.write_json(&out_dir)?;

    println!("\n--- Dashboard ---");
    for chart in dashboard.charts() {
        let labels = chart
            .series
            .iter()
            .map(|s| format!("{} ({} pts)", s.label, s.points.len()))
            .collect::<Vec<_>>();
        println!("{:<34} {}", chart.title, labels.join(", "));
    }
    println!("\n--- Timings ---");
    println!("1. Load time:   {load_time:?}");
    println!("2. Render time: {render_time:?}");
    println!("\nWrote {}", path.display());

    // Flushes buffered log lines.
    drop(_guard);

    Ok(())
}

// ================================================================================================
// Selection
// ================================================================================================

fn selection(
    config: &DashboardConfig,
    broker: &BrokerTable,
    regulatory: &RegulatoryTable,
) -> Result<FilterSelection> {
    let years = match list_var("COTLENS_YEARS") {
        Some(years) => years
            .iter()
            .map(|y| y.parse::<i32>().with_context(|| format!("Invalid year: {y}")))
            .collect::<Result<Vec<_>>>()?,
        None => {
            let mut years = broker.available_years()?;
            years.extend(regulatory.available_years()?);
            years
        }
    };

    let entities = match list_var("COTLENS_ENTITIES") {
        Some(entities) => entities,
        None => broker.available_entities()?,
    };

    let categories = match list_var("COTLENS_CATEGORIES") {
        Some(categories) => categories,
        None => regulatory
            .available_categories()
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    let window = match env::var("COTLENS_WINDOW") {
        Ok(w) => {
            let size = w.parse::<u16>().with_context(|| format!("Invalid window: {w}"))?;
            SmoothingWindow::try_from(size)?
        }
        Err(_) => config.default_window,
    };

    Ok(config
        .selection(years)
        .with_entities(entities)
        .with_categories(categories)
        .with_window(window))
}

fn list_var(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

// ================================================================================================
// Tracing Configuration
// ================================================================================================

/// JSON logs go to `COTLENS_LOG_DIR`, falling back to the user state dir.
/// With neither available they go to stderr.
fn init_tracing() -> Result<Option<WorkerGuard>> {
    let log_dir = env::var_os("COTLENS_LOG_DIR")
        .map(PathBuf::from)
        .or_else(|| dirs::state_dir().map(|d| d.join("cotlens").join("logs")));

    let (writer, guard, log_file) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(&dir)?;
            let stamp = time::OffsetDateTime::now_utc()
                .format(&format_description!("[year][month][day]-[hour][minute][second]"))
                .context("Failed to format timestamp")?;
            let file_name = format!("compare-{stamp}.log");
            let (non_blocking, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, &file_name));
            (BoxMakeWriter::new(non_blocking), Some(guard), Some(dir.join(file_name)))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None, None),
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_current_span(true)
        .with_timer(UtcTime::rfc_3339())
        .init();

    if let Some(path) = log_file {
        println!("Logging to {}", path.display());
    }
    Ok(guard)
}
