//! Error type for `cwa-etl` setup. Errors inside a run never surface here;
//! they are logged and folded into [`crate::RunOutcome`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  #[error("{key} = {value} is out of range (max {max})")]
  OutOfRange { key: &'static str, value: u64, max: u64 },

  #[error("feed client error: {0}")]
  Feed(#[from] cwa_feed::FetchError),

  #[error("store error: {0}")]
  Store(#[from] cwa_store_sqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
