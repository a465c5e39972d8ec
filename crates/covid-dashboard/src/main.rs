//! covid-dashboard server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), loads the
//! CSV source once, derives the chart tables, and serves the dashboard over
//! HTTP.
//!
//! ```
//! cargo run -p covid-dashboard --bin dashboard -- --data ~/data/Covid_Tan.csv
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use covid_core::Pipeline;
use covid_dashboard::ServerConfig;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "COVID-19 age-group statistics dashboard")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// CSV source to load; overrides `data_path` from the configuration.
  #[arg(short, long, value_name = "FILE")]
  data: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("DASHBOARD"))
    .set_override_option(
      "data_path",
      cli.data.map(|p| p.to_string_lossy().into_owned()),
    )
    .context("invalid --data path")?
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Load and derive once; both are immutable from here on.
  let data_path = expand_tilde(&server_cfg.data_path);
  let dataset = covid_csv::load_path(&data_path)
    .with_context(|| format!("failed to load dataset from {data_path:?}"))?;
  let pipeline = Arc::new(Pipeline::new(dataset));
  if let Some(date) = pipeline.latest_date() {
    tracing::info!(
      %date,
      age_groups = pipeline.latest_snapshot().rows.len(),
      "derived latest snapshot"
    );
  } else {
    tracing::warn!("dataset is empty; charts will have no rows");
  }

  let app = covid_dashboard::router(&server_cfg, pipeline);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
