//! Locations — the `dim_location` lookup the fact table hangs off.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable integer surrogate for a location name.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct LocationKey(pub i64);

impl fmt::Display for LocationKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A `dim_location` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
  pub sk:   LocationKey,
  pub name: String,
}
