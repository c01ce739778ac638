//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use cwa_core::{
  forecast::{ForecastValues, ResolvedForecast, Slot, SlotBoundary},
  location::LocationKey,
  store::ForecastStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn slot(date_id: u32, start: u32, end: u32) -> Slot {
  Slot {
    start: SlotBoundary { date_id, time_id: start },
    end:   SlotBoundary { date_id, time_id: end },
  }
}

fn forecast(sk: LocationKey, slot: Slot, wx: &str) -> ResolvedForecast {
  ResolvedForecast {
    location_sk: sk,
    slot,
    values: ForecastValues {
      wx:   Some(wx.into()),
      pop:  Some("20".into()),
      mint: Some("18".into()),
      maxt: Some("25".into()),
      ci:   Some("舒適".into()),
    },
  }
}

// ─── Locations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_location_is_idempotent() {
  let s = store().await;

  let first = s.add_location("臺北市".into()).await.unwrap();
  let again = s.add_location("臺北市".into()).await.unwrap();
  let other = s.add_location("高雄市".into()).await.unwrap();

  assert_eq!(first.sk, again.sk);
  assert_ne!(first.sk, other.sk);
  assert_eq!(first.name, "臺北市");
}

#[tokio::test]
async fn location_map_loads_every_row() {
  let s = store().await;
  let taipei = s.add_location("臺北市".into()).await.unwrap();
  let kaohsiung = s.add_location("高雄市".into()).await.unwrap();

  let map = s.location_map().await.unwrap();
  assert_eq!(map.len(), 2);
  assert_eq!(map["臺北市"], taipei.sk);
  assert_eq!(map["高雄市"], kaohsiung.sk);
}

#[tokio::test]
async fn location_map_empty_store() {
  let s = store().await;
  assert!(s.location_map().await.unwrap().is_empty());
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_inserts_new_rows() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();
  let pulled = at(2024, 1, 1, 0);

  let n = s
    .upsert_batch(
      vec![
        forecast(loc.sk, slot(20240101, 600, 1800), "晴"),
        forecast(loc.sk, slot(20240101, 1800, 2359), "多雲"),
      ],
      pulled,
    )
    .await
    .unwrap();
  assert_eq!(n, 2);

  let rows = s.forecasts_for(loc.sk).await.unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].slot, slot(20240101, 600, 1800));
  assert_eq!(rows[0].values.wx.as_deref(), Some("晴"));
  assert_eq!(rows[0].location_name, "臺北市");
  assert_eq!(rows[0].data_pull_time, pulled);
  assert_eq!(rows[1].values.wx.as_deref(), Some("多雲"));
}

#[tokio::test]
async fn upsert_updates_in_place_on_natural_key() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();
  let key = slot(20240101, 600, 1800);

  s.upsert_batch(vec![forecast(loc.sk, key, "晴")], at(2024, 1, 1, 0))
    .await
    .unwrap();
  let before = s.forecasts_for(loc.sk).await.unwrap();

  let mut update = forecast(loc.sk, key, "陣雨");
  update.values.pop = None;
  s.upsert_batch(vec![update], at(2024, 1, 1, 6)).await.unwrap();
  let after = s.forecasts_for(loc.sk).await.unwrap();

  assert_eq!(after.len(), 1);
  // Row surrogate and natural key are untouched; values and freshness move.
  assert_eq!(after[0].sk, before[0].sk);
  assert_eq!(after[0].natural_key(), before[0].natural_key());
  assert_eq!(after[0].values.wx.as_deref(), Some("陣雨"));
  assert_eq!(after[0].values.pop, None);
  assert_eq!(after[0].data_pull_time, at(2024, 1, 1, 6));
}

#[tokio::test]
async fn upsert_same_key_twice_in_one_batch_keeps_last() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();
  let key = slot(20240101, 600, 1800);

  let n = s
    .upsert_batch(
      vec![forecast(loc.sk, key, "first"), forecast(loc.sk, key, "second")],
      at(2024, 1, 1, 0),
    )
    .await
    .unwrap();
  assert_eq!(n, 2);

  let rows = s.forecasts_for(loc.sk).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].values.wx.as_deref(), Some("second"));
}

#[tokio::test]
async fn upsert_keeps_null_values_null() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();

  let sparse = ResolvedForecast {
    location_sk: loc.sk,
    slot:        slot(20240101, 600, 1800),
    values:      ForecastValues::default(),
  };
  s.upsert_batch(vec![sparse], at(2024, 1, 1, 0)).await.unwrap();

  let rows = s.forecasts_for(loc.sk).await.unwrap();
  assert_eq!(rows[0].values, ForecastValues::default());
}

#[tokio::test]
async fn upsert_empty_batch_is_noop() {
  let s = store().await;
  assert_eq!(s.upsert_batch(vec![], Utc::now()).await.unwrap(), 0);
}

#[tokio::test]
async fn upsert_batch_is_atomic() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();

  // The second record violates the location foreign key; the first must not
  // survive the failed batch.
  let result = s
    .upsert_batch(
      vec![
        forecast(loc.sk, slot(20240101, 600, 1800), "晴"),
        forecast(LocationKey(9_999), slot(20240101, 600, 1800), "晴"),
      ],
      at(2024, 1, 1, 0),
    )
    .await;

  assert!(result.is_err());
  assert!(s.forecasts_for(loc.sk).await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_rejects_impossible_slot_ids() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();

  let result = s
    .upsert_batch(
      vec![forecast(loc.sk, slot(20241340, 600, 1800), "晴")],
      at(2024, 1, 1, 0),
    )
    .await;

  assert!(matches!(result, Err(crate::Error::Core(_))));
}

// ─── Purge ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn purge_removes_only_stale_rows() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();
  let now = at(2025, 6, 1, 0);

  s.upsert_batch(
    vec![forecast(loc.sk, slot(20240101, 600, 1800), "old")],
    now - Duration::days(400),
  )
  .await
  .unwrap();
  s.upsert_batch(
    vec![forecast(loc.sk, slot(20250601, 600, 1800), "fresh")],
    now - Duration::days(10),
  )
  .await
  .unwrap();

  let purged = s.purge_older_than(now - Duration::days(365)).await.unwrap();
  assert_eq!(purged, 1);

  let rows = s.forecasts_for(loc.sk).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].values.wx.as_deref(), Some("fresh"));
  assert_eq!(rows[0].data_pull_time, now - Duration::days(10));
}

#[tokio::test]
async fn purge_keeps_rows_at_cutoff() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();
  let cutoff = at(2024, 1, 1, 0);

  s.upsert_batch(vec![forecast(loc.sk, slot(20240101, 600, 1800), "x")], cutoff)
    .await
    .unwrap();

  assert_eq!(s.purge_older_than(cutoff).await.unwrap(), 0);
  assert_eq!(s.forecasts_for(loc.sk).await.unwrap().len(), 1);
}

#[tokio::test]
async fn refreshed_row_escapes_purge() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();
  let key = slot(20240101, 600, 1800);
  let now = at(2025, 6, 1, 0);

  s.upsert_batch(vec![forecast(loc.sk, key, "x")], now - Duration::days(400))
    .await
    .unwrap();
  s.upsert_batch(vec![forecast(loc.sk, key, "x")], now).await.unwrap();

  assert_eq!(s.purge_older_than(now - Duration::days(365)).await.unwrap(), 0);
  assert_eq!(s.forecasts_for(loc.sk).await.unwrap().len(), 1);
}

#[tokio::test]
async fn purge_leaves_locations_alone() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();

  s.upsert_batch(
    vec![forecast(loc.sk, slot(20240101, 600, 1800), "x")],
    at(2020, 1, 1, 0),
  )
  .await
  .unwrap();
  s.purge_older_than(at(2025, 1, 1, 0)).await.unwrap();

  assert_eq!(s.location_map().await.unwrap().len(), 1);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn latest_forecast_returns_newest_insert() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();

  s.upsert_batch(
    vec![
      forecast(loc.sk, slot(20240101, 600, 1800), "a"),
      forecast(loc.sk, slot(20240101, 1800, 2359), "b"),
    ],
    at(2024, 1, 1, 0),
  )
  .await
  .unwrap();

  let latest = s.latest_forecast("臺北市".into()).await.unwrap().unwrap();
  assert_eq!(latest.values.wx.as_deref(), Some("b"));
  assert_eq!(latest.location_sk, loc.sk);
}

#[tokio::test]
async fn latest_forecast_unknown_location_is_none() {
  let s = store().await;
  s.add_location("臺北市".into()).await.unwrap();

  assert!(s.latest_forecast("臺北市".into()).await.unwrap().is_none());
  assert!(s.latest_forecast("火星".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_fills_calendar_dimensions() {
  let s = store().await;
  let loc = s.add_location("臺北市".into()).await.unwrap();

  s.upsert_batch(
    vec![forecast(
      loc.sk,
      Slot {
        start: SlotBoundary { date_id: 20240106, time_id: 1800 },
        end:   SlotBoundary { date_id: 20240107, time_id: 600 },
      },
      "x",
    )],
    at(2024, 1, 6, 0),
  )
  .await
  .unwrap();

  let (dates, weekend, times): (i64, i64, i64) = s
    .conn_for_tests()
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT
           (SELECT COUNT(*) FROM dim_date),
           (SELECT SUM(is_weekend) FROM dim_date),
           (SELECT COUNT(*) FROM dim_time)",
        [],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
      )?)
    })
    .await
    .unwrap();

  assert_eq!(dates, 2);
  assert_eq!(weekend, 2);
  assert_eq!(times, 2);
}
