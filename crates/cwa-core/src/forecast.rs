//! Forecast records — the rows that flow from the feed into the fact table.
//!
//! A record is identified by its location and its slot (start and end
//! boundaries). Everything else is an optional observation value carried
//! verbatim from the feed; missing upstream data stays `None`.

use chrono::{
  DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc,
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, location::LocationKey};

/// Timestamp layout used by the feed for `startTime` / `endTime`.
pub const FEED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Slot ────────────────────────────────────────────────────────────────────

/// One edge of a forecast window, integer-encoded the way the dimension
/// tables key it: `date_id = YYYYMMDD`, `time_id = HHMM`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
pub struct SlotBoundary {
  pub date_id: u32,
  pub time_id: u32,
}

impl SlotBoundary {
  /// Parse a feed timestamp such as `2024-01-01 06:00:00`.
  pub fn parse(value: &str) -> Result<Self> {
    let dt = NaiveDateTime::parse_from_str(value, FEED_TIMESTAMP_FORMAT)
      .map_err(|e| Error::InvalidTimestamp {
        value:  value.to_owned(),
        reason: e.to_string(),
      })?;
    Self::from_datetime(dt).map_err(|_| Error::InvalidTimestamp {
      value:  value.to_owned(),
      reason: "year outside 0..=9999".to_owned(),
    })
  }

  /// Fails for years that do not fit the four-digit `YYYYMMDD` encoding.
  pub fn from_datetime(dt: NaiveDateTime) -> Result<Self> {
    let year = u32::try_from(dt.year())
      .ok()
      .filter(|y| *y <= 9999)
      .ok_or(Error::YearOutOfRange(dt.year()))?;
    let date_id = year * 10_000 + dt.month() * 100 + dt.day();
    let time_id = dt.hour() * 100 + dt.minute();
    Ok(Self { date_id, time_id })
  }

  /// The calendar date encoded by `date_id`.
  pub fn date(&self) -> Result<NaiveDate> { decode_date_id(self.date_id) }

  /// The wall-clock time encoded by `time_id`.
  pub fn time(&self) -> Result<NaiveTime> { decode_time_id(self.time_id) }
}

pub fn decode_date_id(id: u32) -> Result<NaiveDate> {
  NaiveDate::from_ymd_opt((id / 10_000) as i32, (id / 100) % 100, id % 100)
    .ok_or(Error::InvalidDateId(id))
}

pub fn decode_time_id(id: u32) -> Result<NaiveTime> {
  NaiveTime::from_hms_opt(id / 100, id % 100, 0).ok_or(Error::InvalidTimeId(id))
}

/// A forecast window.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
pub struct Slot {
  pub start: SlotBoundary,
  pub end:   SlotBoundary,
}

// ─── Elements ────────────────────────────────────────────────────────────────

/// The weather elements the pipeline extracts from each location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherElement {
  /// Weather phenomenon text.
  Wx,
  /// Probability of precipitation (%).
  PoP,
  MinT,
  MaxT,
  /// Comfort index.
  Ci,
}

impl WeatherElement {
  pub const ALL: [Self; 5] =
    [Self::Wx, Self::PoP, Self::MinT, Self::MaxT, Self::Ci];

  /// The `elementName` used by the feed.
  pub fn feed_name(self) -> &'static str {
    match self {
      Self::Wx => "Wx",
      Self::PoP => "PoP",
      Self::MinT => "MinT",
      Self::MaxT => "MaxT",
      Self::Ci => "CI",
    }
  }
}

/// The mutable payload of a forecast row. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastValues {
  pub wx:   Option<String>,
  pub pop:  Option<String>,
  pub mint: Option<String>,
  pub maxt: Option<String>,
  pub ci:   Option<String>,
}

impl ForecastValues {
  pub fn get(&self, element: WeatherElement) -> Option<&str> {
    self.slot(element).as_deref()
  }

  pub fn set(&mut self, element: WeatherElement, value: Option<String>) {
    *self.slot_mut(element) = value;
  }

  fn slot(&self, element: WeatherElement) -> &Option<String> {
    match element {
      WeatherElement::Wx => &self.wx,
      WeatherElement::PoP => &self.pop,
      WeatherElement::MinT => &self.mint,
      WeatherElement::MaxT => &self.maxt,
      WeatherElement::Ci => &self.ci,
    }
  }

  fn slot_mut(&mut self, element: WeatherElement) -> &mut Option<String> {
    match element {
      WeatherElement::Wx => &mut self.wx,
      WeatherElement::PoP => &mut self.pop,
      WeatherElement::MinT => &mut self.mint,
      WeatherElement::MaxT => &mut self.maxt,
      WeatherElement::Ci => &mut self.ci,
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A normalized record, still tagged with the location's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastRecord {
  pub location: String,
  pub slot:     Slot,
  pub values:   ForecastValues,
}

/// The identity of a fact row. At most one stored row exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NaturalKey {
  pub location_sk: LocationKey,
  pub slot:        Slot,
}

/// A record whose location has been mapped to its surrogate key; input to
/// [`crate::store::ForecastStore::upsert_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedForecast {
  pub location_sk: LocationKey,
  pub slot:        Slot,
  pub values:      ForecastValues,
}

impl ResolvedForecast {
  pub fn natural_key(&self) -> NaturalKey {
    NaturalKey { location_sk: self.location_sk, slot: self.slot }
  }
}

/// A row as read back from the fact table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredForecast {
  /// Row surrogate; assigned on first insert and never rewritten.
  pub sk:             i64,
  pub location_sk:    LocationKey,
  pub location_name:  String,
  pub slot:           Slot,
  pub values:         ForecastValues,
  /// Freshness timestamp; the only input to retention.
  pub data_pull_time: DateTime<Utc>,
}

impl StoredForecast {
  pub fn natural_key(&self) -> NaturalKey {
    NaturalKey { location_sk: self.location_sk, slot: self.slot }
  }
}
