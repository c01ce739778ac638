//! Error types for the feed crate.

use thiserror::Error;

/// Errors raised while preparing a request or normalizing a single slot.
#[derive(Debug, Error)]
pub enum Error {
  #[error("no feed authorization token configured")]
  MissingToken,

  #[error("invalid feed url {url:?}: {reason}")]
  InvalidUrl { url: String, reason: String },

  #[error("slot is missing {0}")]
  MissingField(&'static str),

  #[error(transparent)]
  Timestamp(#[from] cwa_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a fetch produced no payload. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("failed to build HTTP client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("request failed: {0}")]
  Transport(#[source] reqwest::Error),

  #[error("feed responded with status {0}")]
  Status(reqwest::StatusCode),

  #[error("malformed feed payload: {0}")]
  Malformed(#[from] serde_json::Error),

  #[error("feed reported success = {0:?}")]
  Unsuccessful(String),
}
