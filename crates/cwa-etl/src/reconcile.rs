//! Upsert reconciliation: write the batch, then enforce retention.

use chrono::{DateTime, Duration, Utc};
use cwa_core::{forecast::ResolvedForecast, store::ForecastStore};
use tracing::info;

/// Counts reported by one [`Reconciler::reconcile`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
  pub upserted: usize,
  pub purged:   usize,
}

/// Merges resolved records into a store and purges rows past retention.
pub struct Reconciler<'s, S> {
  store:     &'s S,
  retention: Duration,
}

impl<'s, S: ForecastStore> Reconciler<'s, S> {
  pub fn new(store: &'s S, retention: Duration) -> Self { Self { store, retention } }

  /// Upsert `records` stamped with `now`, then delete every row whose
  /// freshness timestamp is older than `now - retention`, whether or not
  /// this batch touched it.
  ///
  /// A failed upsert leaves the store untouched and skips the purge.
  pub async fn reconcile(
    &self,
    records: Vec<ResolvedForecast>,
    now:     DateTime<Utc>,
  ) -> Result<ReconcileReport, S::Error> {
    let upserted = self.store.upsert_batch(records, now).await?;
    info!(upserted, "new or updated forecast records written");

    // A window reaching past the representable range purges nothing.
    let cutoff = now
      .checked_sub_signed(self.retention)
      .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let purged = self.store.purge_older_than(cutoff).await?;
    info!(purged, %cutoff, "expired forecast records deleted");

    Ok(ReconcileReport { upserted, purged })
  }
}
