//! [`SqliteStore`] — the SQLite implementation of [`ForecastStore`].

use std::{
  collections::{BTreeSet, HashMap},
  path::Path,
};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use cwa_core::{
  forecast::{ResolvedForecast, StoredForecast},
  location::{Location, LocationKey},
  store::ForecastStore,
};

use crate::{
  Result,
  encode::{DateDim, FORECAST_COLUMNS, RawForecast, TimeDim, encode_dt},
  schema::SCHEMA,
};

const UPSERT_FORECAST: &str = "
  INSERT INTO fact_weather_forecast (
    location_sk, start_date_id, start_time_id, end_date_id, end_time_id,
    wx, pop, mint, maxt, ci, data_pull_time
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
  ON CONFLICT (location_sk, start_date_id, start_time_id, end_date_id, end_time_id)
  DO UPDATE SET
    wx             = excluded.wx,
    pop            = excluded.pop,
    mint           = excluded.mint,
    maxt           = excluded.maxt,
    ci             = excluded.ci,
    data_pull_time = excluded.data_pull_time";

const INSERT_DATE_DIM: &str = "
  INSERT OR IGNORE INTO dim_date (
    id, full_date, year, month, day, day_of_week, is_weekend
  ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const INSERT_TIME_DIM: &str = "
  INSERT OR IGNORE INTO dim_time (id, full_time, hour, minute)
  VALUES (?1, ?2, ?3, ?4)";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A forecast store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection, waiting for queued calls to finish.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection {
    &self.conn
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ForecastStore impl ──────────────────────────────────────────────────────

impl ForecastStore for SqliteStore {
  type Error = crate::Error;

  // ── Locations ─────────────────────────────────────────────────────────────

  async fn location_map(&self) -> Result<HashMap<String, LocationKey>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT location_name, sk FROM dim_location")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(name, sk)| (name, LocationKey(sk)))
        .collect(),
    )
  }

  async fn add_location(&self, name: String) -> Result<Location> {
    let lookup = name.clone();

    let sk: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO dim_location (location_name) VALUES (?1)
           ON CONFLICT (location_name) DO NOTHING",
          rusqlite::params![lookup],
        )?;
        let sk = conn.query_row(
          "SELECT sk FROM dim_location WHERE location_name = ?1",
          rusqlite::params![lookup],
          |r| r.get(0),
        )?;
        Ok(sk)
      })
      .await?;

    Ok(Location { sk: LocationKey(sk), name })
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn upsert_batch(
    &self,
    records:   Vec<ResolvedForecast>,
    pulled_at: DateTime<Utc>,
  ) -> Result<usize> {
    if records.is_empty() {
      return Ok(0);
    }

    let pulled_at_str = encode_dt(pulled_at);

    // Dimension rows are derived up front so a bad id fails before the
    // transaction opens.
    let date_ids: BTreeSet<u32> = records
      .iter()
      .flat_map(|r| [r.slot.start.date_id, r.slot.end.date_id])
      .collect();
    let time_ids: BTreeSet<u32> = records
      .iter()
      .flat_map(|r| [r.slot.start.time_id, r.slot.end.time_id])
      .collect();
    let dates = date_ids
      .into_iter()
      .map(DateDim::from_id)
      .collect::<Result<Vec<_>>>()?;
    let times = time_ids
      .into_iter()
      .map(TimeDim::from_id)
      .collect::<Result<Vec<_>>>()?;

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(INSERT_DATE_DIM)?;
          for d in &dates {
            stmt.execute(rusqlite::params![
              d.id,
              d.full_date,
              d.year,
              d.month,
              d.day,
              d.day_of_week,
              d.is_weekend,
            ])?;
          }

          let mut stmt = tx.prepare_cached(INSERT_TIME_DIM)?;
          for t in &times {
            stmt.execute(rusqlite::params![t.id, t.full_time, t.hour, t.minute])?;
          }

          let mut stmt = tx.prepare_cached(UPSERT_FORECAST)?;
          for r in &records {
            stmt.execute(rusqlite::params![
              r.location_sk.0,
              r.slot.start.date_id,
              r.slot.start.time_id,
              r.slot.end.date_id,
              r.slot.end.time_id,
              r.values.wx,
              r.values.pop,
              r.values.mint,
              r.values.maxt,
              r.values.ci,
              pulled_at_str,
            ])?;
          }
        }
        // Dropping `tx` without commit on any error above rolls back the
        // whole batch.
        tx.commit()?;
        Ok(records.len())
      })
      .await?;

    Ok(written)
  }

  async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
    let cutoff_str = encode_dt(cutoff);

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "DELETE FROM fact_weather_forecast WHERE data_pull_time < ?1",
          rusqlite::params![cutoff_str],
        )?;
        Ok(n)
      })
      .await?;

    Ok(deleted)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn forecasts_for(
    &self,
    location_sk: LocationKey,
  ) -> Result<Vec<StoredForecast>> {
    let sk = location_sk.0;

    let raws: Vec<RawForecast> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FORECAST_COLUMNS}
           FROM fact_weather_forecast f
           JOIN dim_location l ON l.sk = f.location_sk
           WHERE f.location_sk = ?1
           ORDER BY f.start_date_id, f.start_time_id, f.end_date_id, f.end_time_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![sk], RawForecast::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawForecast::into_stored).collect()
  }

  async fn latest_forecast(
    &self,
    location_name: String,
  ) -> Result<Option<StoredForecast>> {
    let raw: Option<RawForecast> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {FORECAST_COLUMNS}
           FROM fact_weather_forecast f
           JOIN dim_location l ON l.sk = f.location_sk
           WHERE l.location_name = ?1
           ORDER BY f.sk DESC
           LIMIT 1"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![location_name], RawForecast::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawForecast::into_stored).transpose()
  }
}
