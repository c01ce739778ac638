//! The job driver: one scheduled run of the pipeline.
//!
//! authorize → fetch → normalize → resolve → upsert → purge. Every stage
//! either hands its output to the next or ends the run with a logged
//! [`RunOutcome`]; nothing escapes as an error or panic.

use std::path::Path;

use chrono::{DateTime, Utc};
use cwa_core::store::ForecastStore;
use cwa_feed::{FeedClient, FeedSource, authorize_url, normalize, redact_url};
use cwa_store_sqlite::SqliteStore;
use tracing::{error, info, warn};

use crate::{
  EtlConfig, Result,
  reconcile::Reconciler,
  resolve::LocationResolver,
};

/// Counts for a run that reached the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
  /// Records produced by normalization.
  pub normalized: usize,
  /// Records dropped for lack of a location key.
  pub unresolved: usize,
  pub upserted:   usize,
  pub purged:     usize,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// No token, or the feed URL could not be built. Nothing was attempted.
  Misconfigured,
  /// The feed could not be fetched or parsed. The store was not touched.
  FetchFailed,
  /// The feed parsed but normalization produced no records.
  NoUsableData,
  /// The store could not be opened or the write phase failed and was
  /// rolled back.
  StoreFailed,
  Completed(RunReport),
}

impl RunOutcome {
  pub fn is_completed(&self) -> bool { matches!(self, Self::Completed(_)) }
}

/// Runs the pipeline against a [`FeedSource`] with a fixed configuration.
pub struct JobDriver<F> {
  config: EtlConfig,
  source: F,
}

impl JobDriver<FeedClient> {
  /// A driver that fetches over HTTP with the configured timeout.
  pub fn from_config(config: EtlConfig) -> Result<Self> {
    let source = FeedClient::new(config.fetch_timeout())?;
    Ok(Self::new(config, source))
  }
}

impl<F: FeedSource> JobDriver<F> {
  pub fn new(config: EtlConfig, source: F) -> Self { Self { config, source } }

  pub fn config(&self) -> &EtlConfig { &self.config }

  /// Open the configured SQLite store, run once, and close it again.
  pub async fn run_with_store_at(&self, path: &Path) -> RunOutcome {
    let store = match SqliteStore::open(path).await {
      Ok(store) => store,
      Err(e) => {
        error!(path = %path.display(), error = %e, "failed to open forecast store");
        return RunOutcome::StoreFailed;
      }
    };

    let outcome = self.run(&store).await;

    if let Err(e) = store.close().await {
      warn!(error = %e, "failed to close forecast store cleanly");
    }
    outcome
  }

  /// Run once, stamping written rows with the current time.
  pub async fn run<S: ForecastStore>(&self, store: &S) -> RunOutcome {
    self.run_at(store, Utc::now()).await
  }

  /// Run once with an explicit "now" for freshness and retention.
  pub async fn run_at<S: ForecastStore>(
    &self,
    store: &S,
    now:   DateTime<Utc>,
  ) -> RunOutcome {
    let feed = &self.config.feed;
    let url = match authorize_url(
      &feed.url,
      feed.authorization_token.as_deref(),
      &feed.sort,
    ) {
      Ok(url) => url,
      Err(e) => {
        error!(error = %e, "cannot build feed request");
        return RunOutcome::Misconfigured;
      }
    };

    info!(url = %redact_url(&url), "starting forecast ETL run");
    let payload = match self.source.fetch(&url).await {
      Ok(payload) => payload,
      Err(e) => {
        error!(error = %e, "failed to fetch data from the feed");
        return RunOutcome::FetchFailed;
      }
    };

    let records = normalize(&payload);
    if records.is_empty() {
      warn!("no valid data to process after normalization");
      return RunOutcome::NoUsableData;
    }
    let normalized = records.len();

    let resolver = match LocationResolver::load(store).await {
      Ok(r) => r,
      Err(e) => {
        error!(error = %e, "failed to load location lookup");
        return RunOutcome::StoreFailed;
      }
    };
    let resolution = resolver.resolve(records);

    let reconciler = Reconciler::new(store, self.config.retention());
    let report = match reconciler.reconcile(resolution.resolved, now).await {
      Ok(report) => report,
      Err(e) => {
        error!(error = %e, "store write failed; batch rolled back");
        return RunOutcome::StoreFailed;
      }
    };

    let report = RunReport {
      normalized,
      unresolved: resolution.unresolved,
      upserted: report.upserted,
      purged: report.purged,
    };
    info!(
      normalized = report.normalized,
      unresolved = report.unresolved,
      upserted = report.upserted,
      purged = report.purged,
      locations = resolver.len(),
      "forecast ETL run finished"
    );
    RunOutcome::Completed(report)
  }
}
