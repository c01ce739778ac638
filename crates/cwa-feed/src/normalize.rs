//! Flattens the nested feed into one record per (location, slot).
//!
//! Pipeline:
//!   FeedPayload
//!     └─ per location: element name → slot list
//!          └─ slot axis = first listed element's slots
//!               └─ per slot index: parse boundaries, pick each element's
//!                  value at that index (or null)

use std::collections::HashMap;

use cwa_core::forecast::{
  ForecastRecord, ForecastValues, Slot, SlotBoundary, WeatherElement,
};
use tracing::{debug, warn};

use crate::{
  error::{Error, Result},
  payload::{FeedPayload, RawLocation, RawSlot},
};

/// Convert a payload into flat forecast records.
///
/// Never fails: a payload without `records` yields nothing, and a slot with
/// a missing or unparseable boundary is skipped with a warning while the
/// remaining slots and locations are still processed.
pub fn normalize(payload: &FeedPayload) -> Vec<ForecastRecord> {
  let Some(records) = &payload.records else {
    debug!("feed payload has no records container");
    return Vec::new();
  };

  records.location.iter().flat_map(normalize_location).collect()
}

fn normalize_location(location: &RawLocation) -> Vec<ForecastRecord> {
  let Some(name) = location.location_name.as_deref() else {
    warn!("skipping feed location without a locationName");
    return Vec::new();
  };

  let mut elements: HashMap<&str, &[RawSlot]> = HashMap::new();
  let mut axis_name = None;
  for element in &location.weather_element {
    let Some(element_name) = element.element_name.as_deref() else {
      warn!(location = %name, "skipping weather element without an elementName");
      continue;
    };
    axis_name.get_or_insert(element_name);
    elements.insert(element_name, &element.time);
  }

  let Some(axis) = axis_name.and_then(|n| elements.get(n)) else {
    debug!(location = %name, "location has no weather elements");
    return Vec::new();
  };

  axis
    .iter()
    .enumerate()
    .filter_map(|(index, slot)| match parse_slot(slot) {
      Ok(slot) => Some(ForecastRecord {
        location: name.to_owned(),
        slot,
        values: values_at(&elements, index),
      }),
      Err(e) => {
        warn!(location = %name, index, error = %e, "skipping forecast slot");
        None
      }
    })
    .collect()
}

fn parse_slot(slot: &RawSlot) -> Result<Slot> {
  let start = slot
    .start_time
    .as_deref()
    .ok_or(Error::MissingField("startTime"))?;
  let end = slot
    .end_time
    .as_deref()
    .ok_or(Error::MissingField("endTime"))?;

  Ok(Slot {
    start: SlotBoundary::parse(start)?,
    end:   SlotBoundary::parse(end)?,
  })
}

/// Each element is bounds-checked on its own; a short or absent element
/// nulls only its own field.
fn values_at(elements: &HashMap<&str, &[RawSlot]>, index: usize) -> ForecastValues {
  let mut values = ForecastValues::default();
  for element in WeatherElement::ALL {
    let value = elements
      .get(element.feed_name())
      .and_then(|slots| slots.get(index))
      .and_then(|slot| slot.parameter.as_ref())
      .and_then(|p| p.parameter_name.clone());
    values.set(element, value);
  }
  values
}
