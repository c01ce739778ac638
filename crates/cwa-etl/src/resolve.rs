//! Location resolution: display names → `dim_location` surrogate keys.

use std::collections::{BTreeSet, HashMap};

use cwa_core::{
  forecast::{ForecastRecord, ResolvedForecast},
  location::LocationKey,
  store::ForecastStore,
};
use tracing::{debug, warn};

/// A read-only snapshot of the location lookup table, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct LocationResolver {
  keys: HashMap<String, LocationKey>,
}

/// The write set produced by [`LocationResolver::resolve`].
#[derive(Debug, Default)]
pub struct Resolution {
  pub resolved:          Vec<ResolvedForecast>,
  /// Records dropped because their location has no key.
  pub unresolved:        usize,
  pub unknown_locations: BTreeSet<String>,
}

impl LocationResolver {
  /// Load the full mapping from `store` in one query.
  pub async fn load<S: ForecastStore>(store: &S) -> Result<Self, S::Error> {
    let keys = store.location_map().await?;
    debug!(locations = keys.len(), "loaded location lookup");
    Ok(Self { keys })
  }

  pub fn from_map(keys: HashMap<String, LocationKey>) -> Self { Self { keys } }

  pub fn get(&self, name: &str) -> Option<LocationKey> { self.keys.get(name).copied() }

  pub fn len(&self) -> usize { self.keys.len() }

  pub fn is_empty(&self) -> bool { self.keys.is_empty() }

  /// Attach surrogate keys. Records naming an unknown location cannot
  /// satisfy the fact table's foreign key; they are dropped and reported.
  pub fn resolve(&self, records: Vec<ForecastRecord>) -> Resolution {
    let mut out = Resolution::default();

    for record in records {
      match self.get(&record.location) {
        Some(location_sk) => out.resolved.push(ResolvedForecast {
          location_sk,
          slot: record.slot,
          values: record.values,
        }),
        None => {
          out.unresolved += 1;
          out.unknown_locations.insert(record.location);
        }
      }
    }

    if out.unresolved > 0 {
      warn!(
        dropped = out.unresolved,
        locations = ?out.unknown_locations,
        "dropping records for locations missing from dim_location"
      );
    }

    out
  }
}
