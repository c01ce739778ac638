//! Wire types for the `F-C0032-001` JSON document.
//!
//! Every field the normalizer reads is optional here: a missing or `null`
//! field is a per-slot or per-location data problem, not a malformed
//! payload.

use serde::{Deserialize, Deserializer, Serialize};

/// The top-level document. `records` absent means "no data".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedPayload {
  /// `"true"` on a good response. Anything else is treated as a failed
  /// fetch; an absent flag is tolerated.
  #[serde(default)]
  pub success: Option<String>,
  #[serde(default)]
  pub records: Option<Records>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Records {
  #[serde(default, deserialize_with = "null_as_empty")]
  pub location: Vec<RawLocation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocation {
  #[serde(default)]
  pub location_name:   Option<String>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub weather_element: Vec<RawElement>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
  #[serde(default)]
  pub element_name: Option<String>,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub time:         Vec<RawSlot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSlot {
  #[serde(default)]
  pub start_time: Option<String>,
  #[serde(default)]
  pub end_time:   Option<String>,
  #[serde(default)]
  pub parameter:  Option<RawParameter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParameter {
  #[serde(default)]
  pub parameter_name: Option<String>,
}

fn null_as_empty<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
}
