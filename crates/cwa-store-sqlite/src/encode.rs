//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexicographic comparison in SQL matches
//! chronological order. Slot ids are stored as plain integers.

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc, Weekday};
use cwa_core::forecast::{
  ForecastValues, Slot, SlotBoundary, StoredForecast, decode_date_id,
  decode_time_id,
};
use cwa_core::location::LocationKey;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Dimension rows ──────────────────────────────────────────────────────────

/// Column values for one `dim_date` row.
pub struct DateDim {
  pub id:          u32,
  pub full_date:   String,
  pub year:        i32,
  pub month:       u32,
  pub day:         u32,
  pub day_of_week: u32,
  pub is_weekend:  bool,
}

impl DateDim {
  pub fn from_id(id: u32) -> Result<Self> {
    let date = decode_date_id(id)?;
    Ok(Self {
      id,
      full_date: date.format("%Y-%m-%d").to_string(),
      year: date.year(),
      month: date.month(),
      day: date.day(),
      day_of_week: date.weekday().number_from_monday(),
      is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
    })
  }
}

/// Column values for one `dim_time` row.
pub struct TimeDim {
  pub id:        u32,
  pub full_time: String,
  pub hour:      u32,
  pub minute:    u32,
}

impl TimeDim {
  pub fn from_id(id: u32) -> Result<Self> {
    let time = decode_time_id(id)?;
    Ok(Self {
      id,
      full_time: time.format("%H:%M:%S").to_string(),
      hour: time.hour(),
      minute: time.minute(),
    })
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `fact_weather_forecast` row joined with
/// `dim_location`.
pub struct RawForecast {
  pub sk:             i64,
  pub location_sk:    i64,
  pub location_name:  String,
  pub start_date_id:  u32,
  pub start_time_id:  u32,
  pub end_date_id:    u32,
  pub end_time_id:    u32,
  pub wx:             Option<String>,
  pub pop:            Option<String>,
  pub mint:           Option<String>,
  pub maxt:           Option<String>,
  pub ci:             Option<String>,
  pub data_pull_time: String,
}

/// Column list matching [`RawForecast::from_row`]; expects the fact table
/// aliased as `f` and `dim_location` as `l`.
pub const FORECAST_COLUMNS: &str = "
  f.sk, f.location_sk, l.location_name,
  f.start_date_id, f.start_time_id, f.end_date_id, f.end_time_id,
  f.wx, f.pop, f.mint, f.maxt, f.ci, f.data_pull_time";

impl RawForecast {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sk:             row.get(0)?,
      location_sk:    row.get(1)?,
      location_name:  row.get(2)?,
      start_date_id:  row.get(3)?,
      start_time_id:  row.get(4)?,
      end_date_id:    row.get(5)?,
      end_time_id:    row.get(6)?,
      wx:             row.get(7)?,
      pop:            row.get(8)?,
      mint:           row.get(9)?,
      maxt:           row.get(10)?,
      ci:             row.get(11)?,
      data_pull_time: row.get(12)?,
    })
  }

  pub fn into_stored(self) -> Result<StoredForecast> {
    Ok(StoredForecast {
      sk:             self.sk,
      location_sk:    LocationKey(self.location_sk),
      location_name:  self.location_name,
      slot:           Slot {
        start: SlotBoundary {
          date_id: self.start_date_id,
          time_id: self.start_time_id,
        },
        end:   SlotBoundary {
          date_id: self.end_date_id,
          time_id: self.end_time_id,
        },
      },
      values:         ForecastValues {
        wx:   self.wx,
        pop:  self.pop,
        mint: self.mint,
        maxt: self.maxt,
        ci:   self.ci,
      },
      data_pull_time: decode_dt(&self.data_pull_time)?,
    })
  }
}
