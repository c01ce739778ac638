//! The `ForecastStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `cwa-store-sqlite`).
//! The pipeline in `cwa-etl` depends on this abstraction, not on any concrete
//! backend or SQL dialect.

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, Utc};

use crate::{
  forecast::{ResolvedForecast, StoredForecast},
  location::{Location, LocationKey},
};

/// Abstraction over the durable forecast store.
///
/// The fact table is keyed by [`NaturalKey`](crate::forecast::NaturalKey);
/// writes go through [`ForecastStore::upsert_batch`] only, deletes through
/// [`ForecastStore::purge_older_than`] only.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait ForecastStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Locations ─────────────────────────────────────────────────────────

  /// Load the complete name → surrogate key mapping in one query.
  fn location_map(
    &self,
  ) -> impl Future<Output = Result<HashMap<String, LocationKey>, Self::Error>>
  + Send
  + '_;

  /// Return the location named `name`, creating it if absent. The pipeline
  /// never calls this; it exists for seeding the lookup table.
  fn add_location(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Location, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Insert every record by natural key, overwriting the value columns and
  /// setting the freshness timestamp to `pulled_at` where a row already
  /// exists. The whole batch is applied atomically. Returns the number of
  /// records written.
  fn upsert_batch(
    &self,
    records: Vec<ResolvedForecast>,
    pulled_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Delete every fact row whose freshness timestamp is strictly before
  /// `cutoff`. Returns the number of rows deleted.
  fn purge_older_than(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// All fact rows for a location, ordered by slot.
  fn forecasts_for(
    &self,
    location_sk: LocationKey,
  ) -> impl Future<Output = Result<Vec<StoredForecast>, Self::Error>> + Send + '_;

  /// The most recently inserted fact row for the named location, or `None`
  /// if the location is unknown or has no rows.
  fn latest_forecast(
    &self,
    location_name: String,
  ) -> impl Future<Output = Result<Option<StoredForecast>, Self::Error>> + Send + '_;
}
