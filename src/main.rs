use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use hybrid_signal::config::{Config, LoggingConfig};
use hybrid_signal::model::{PanelFile, PricePanel};
use hybrid_signal::report::{digest_bytes, OutputRecord};
use hybrid_signal::Pipeline;

const DEFAULT_PANEL_PATH: &str = "data/prices.json";

fn main() -> Result<()> {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging);

    let panel_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PANEL_PATH));
    let panel = load_panel(&panel_path)?;
    tracing::info!(
        path = %panel_path.display(),
        assets = panel.assets().len(),
        dates = panel.len(),
        "Loaded price panel"
    );

    let pipeline = Pipeline::new(config.clone());
    let output = pipeline
        .run(&panel, Utc::now())
        .context("signal pipeline failed")?;

    for (asset, (signal, weight)) in output
        .record
        .universe
        .iter()
        .zip(output.record.signal.iter().zip(&output.record.weight))
    {
        tracing::info!(asset = %asset, signal, weight, "Final position");
    }
    tracing::info!(
        max_position_size = output.record.risk_metrics.max_position_size,
        sector_exposure = ?output.record.risk_metrics.sector_exposure,
        "Risk metrics"
    );

    let (json_path, digest) = write_record(&output.record, Path::new(&config.output.signal_dir))?;
    tracing::info!(path = %json_path.display(), sha256 = %digest, "Signal file written");
    println!("{}", json_path.display());
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        logging
            .level
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_panel(path: &Path) -> Result<PricePanel> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read price panel {}", path.display()))?;
    let file: PanelFile = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse price panel {}", path.display()))?;
    PricePanel::try_from(file).with_context(|| format!("invalid price panel {}", path.display()))
}

/// Write `<dir>/<date>.json` and a `<date>.sha256` sidecar of the same bytes.
fn write_record(record: &OutputRecord, dir: &Path) -> Result<(PathBuf, String)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let json = record.to_json_pretty().context("failed to serialise record")?;
    let json_path = dir.join(format!("{}.json", record.file_stem()));
    std::fs::write(&json_path, &json)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    let digest = digest_bytes(json.as_bytes());
    let digest_path = dir.join(format!("{}.sha256", record.file_stem()));
    std::fs::write(&digest_path, &digest)
        .with_context(|| format!("failed to write {}", digest_path.display()))?;
    Ok((json_path, digest))
}
