//! cwa-etl binary.
//!
//! Reads `cwa-etl.toml` (or the path given with `--config`), layers `CWA_*`
//! environment overrides on top, and runs the forecast pipeline against a
//! local SQLite store.
//!
//! ```
//! AUTHORIZATION_TOKEN=CWA-XXXX cwa-etl run
//! cwa-etl run --every 6
//! cwa-etl locations add 臺北市 新北市
//! cwa-etl latest 臺北市
//! ```

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use cwa_core::store::ForecastStore;
use cwa_etl::{EtlConfig, JobDriver, schedule};
use cwa_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "CWA county forecast ETL")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "cwa-etl.toml")]
  config: PathBuf,

  /// Open-data API token. Overrides `feed.authorization_token`.
  #[arg(long, env = "AUTHORIZATION_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// SQLite database path. Overrides `store_path`.
  #[arg(long)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Fetch, normalize and write the forecast feed.
  Run {
    /// Repeat every N hours until interrupted.
    #[arg(long, value_name = "HOURS")]
    every: Option<u64>,
  },
  /// Inspect or seed the location lookup table.
  #[command(subcommand)]
  Locations(LocationsCommand),
  /// Print the most recently inserted forecast row for a location as JSON.
  Latest { name: String },
}

#[derive(Subcommand)]
enum LocationsCommand {
  /// Insert locations that are not yet known and print their keys.
  Add {
    #[arg(required = true)]
    names: Vec<String>,
  },
  /// Print every known location and its key.
  List,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut config = EtlConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
  if let Some(token) = cli.token {
    config.feed.authorization_token = Some(token);
  }
  if let Some(store) = cli.store {
    config.store_path = store;
  }
  config.store_path = expand_tilde(&config.store_path);

  match cli.command.unwrap_or(Command::Run { every: None }) {
    Command::Run { every } => {
      if let Some(hours) = every {
        config.interval_hours = Some(hours);
      }
      config.validate().context("invalid configuration")?;
      run(config).await
    }
    Command::Locations(cmd) => {
      locations(&config.store_path, cmd).await?;
      Ok(ExitCode::SUCCESS)
    }
    Command::Latest { name } => latest(&config.store_path, name).await,
  }
}

async fn run(config: EtlConfig) -> anyhow::Result<ExitCode> {
  let interval = config.interval();
  let store_path = config.store_path.clone();
  let driver = JobDriver::from_config(config).context("failed to build feed client")?;

  let Some(interval) = interval else {
    let outcome = driver.run_with_store_at(&store_path).await;
    return Ok(if outcome.is_completed() { ExitCode::SUCCESS } else { ExitCode::FAILURE });
  };

  tracing::info!(
    every_hours = interval.as_secs() / 3600,
    store = %store_path.display(),
    "running on a schedule; press Ctrl-C to stop"
  );
  let driver = &driver;
  let path = store_path.as_path();
  schedule::run_every(interval, shutdown_signal(), move || driver.run_with_store_at(path))
    .await;
  Ok(ExitCode::SUCCESS)
}

async fn locations(path: &Path, cmd: LocationsCommand) -> anyhow::Result<()> {
  let store = open_store(path).await?;

  match cmd {
    LocationsCommand::Add { names } => {
      for name in names {
        let location = store
          .add_location(name.clone())
          .await
          .with_context(|| format!("failed to add location {name}"))?;
        println!("{}\t{}", location.sk, location.name);
      }
    }
    LocationsCommand::List => {
      let mut rows: Vec<_> = store
        .location_map()
        .await
        .context("failed to read locations")?
        .into_iter()
        .collect();
      rows.sort_by_key(|(_, sk)| *sk);
      for (name, sk) in rows {
        println!("{sk}\t{name}");
      }
    }
  }

  store.close().await.context("failed to close store")?;
  Ok(())
}

async fn latest(path: &Path, name: String) -> anyhow::Result<ExitCode> {
  let store = open_store(path).await?;
  let row = store
    .latest_forecast(name.clone())
    .await
    .with_context(|| format!("failed to read forecasts for {name}"))?;
  store.close().await.context("failed to close store")?;

  match row {
    Some(row) => {
      println!("{}", serde_json::to_string_pretty(&row)?);
      Ok(ExitCode::SUCCESS)
    }
    None => {
      eprintln!("no forecasts stored for {name}");
      Ok(ExitCode::FAILURE)
    }
  }
}

async fn open_store(path: &Path) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {}", path.display()))
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for Ctrl-C; stopping");
  }
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
