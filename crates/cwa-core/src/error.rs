//! Error types for `cwa-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid slot timestamp {value:?}: {reason}")]
  InvalidTimestamp { value: String, reason: String },

  #[error("year {0} does not fit a YYYYMMDD date id")]
  YearOutOfRange(i32),

  #[error("invalid date id: {0}")]
  InvalidDateId(u32),

  #[error("invalid time id: {0}")]
  InvalidTimeId(u32),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
