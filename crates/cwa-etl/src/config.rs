//! Runtime configuration, deserialised from a TOML file layered under
//! `CWA_*` environment variables.

use std::{path::{Path, PathBuf}, time::Duration};

use cwa_feed::DEFAULT_FEED_URL;
use serde::Deserialize;

use crate::{Error, Result};

/// Upper bound for `retention_days` (100 years).
pub const MAX_RETENTION_DAYS: u32 = 36_500;
/// Upper bound for `interval_hours` (one year).
pub const MAX_INTERVAL_HOURS: u64 = 24 * 366;

/// Everything a run needs. Built once at startup and handed to the
/// [`JobDriver`](crate::JobDriver); nothing is read from ambient state later.
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
  #[serde(default)]
  pub feed:           FeedConfig,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// Rows not refreshed within this many days are purged.
  #[serde(default = "default_retention_days")]
  pub retention_days: u32,
  /// When set, `run` repeats on this interval instead of exiting.
  #[serde(default)]
  pub interval_hours: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  #[serde(default = "default_feed_url")]
  pub url:                 String,
  #[serde(default)]
  pub authorization_token: Option<String>,
  #[serde(default = "default_sort")]
  pub sort:                String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:        u64,
}

fn default_store_path() -> PathBuf { PathBuf::from("cwa.db") }
fn default_retention_days() -> u32 { 365 }
fn default_feed_url() -> String { DEFAULT_FEED_URL.to_owned() }
fn default_sort() -> String { "time".to_owned() }
fn default_timeout_secs() -> u64 { 30 }

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      url:                 default_feed_url(),
      authorization_token: None,
      sort:                default_sort(),
      timeout_secs:        default_timeout_secs(),
    }
  }
}

impl Default for EtlConfig {
  fn default() -> Self {
    Self {
      feed:           FeedConfig::default(),
      store_path:     default_store_path(),
      retention_days: default_retention_days(),
      interval_hours: None,
    }
  }
}

impl EtlConfig {
  /// Read `path` (optional; missing file means defaults) then apply
  /// `CWA_*` environment overrides, e.g. `CWA_FEED__AUTHORIZATION_TOKEN`.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CWA").separator("__"))
      .build()?;
    let cfg: Self = settings.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Parse a TOML document without consulting the environment.
  pub fn from_toml(toml: &str) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()?;
    let cfg: Self = settings.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Reject values whose derived durations cannot be represented.
  pub fn validate(&self) -> Result<()> {
    if self.retention_days > MAX_RETENTION_DAYS {
      return Err(Error::OutOfRange {
        key:   "retention_days",
        value: u64::from(self.retention_days),
        max:   u64::from(MAX_RETENTION_DAYS),
      });
    }
    if let Some(hours) = self.interval_hours
      && hours > MAX_INTERVAL_HOURS
    {
      return Err(Error::OutOfRange {
        key:   "interval_hours",
        value: hours,
        max:   MAX_INTERVAL_HOURS,
      });
    }
    Ok(())
  }

  pub fn retention(&self) -> chrono::Duration {
    chrono::Duration::days(i64::from(self.retention_days))
  }

  pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.feed.timeout_secs) }

  pub fn interval(&self) -> Option<Duration> {
    self
      .interval_hours
      .filter(|h| *h > 0)
      .and_then(|h| h.checked_mul(60 * 60))
      .map(Duration::from_secs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_document_uses_defaults() {
    let cfg = EtlConfig::from_toml("").unwrap();
    assert_eq!(cfg.feed.url, DEFAULT_FEED_URL);
    assert_eq!(cfg.feed.sort, "time");
    assert_eq!(cfg.feed.timeout_secs, 30);
    assert_eq!(cfg.feed.authorization_token, None);
    assert_eq!(cfg.store_path, PathBuf::from("cwa.db"));
    assert_eq!(cfg.retention_days, 365);
    assert_eq!(cfg.retention(), chrono::Duration::days(365));
    assert_eq!(cfg.interval(), None);
  }

  #[test]
  fn document_overrides_defaults() {
    let cfg = EtlConfig::from_toml(
      r#"
        store_path     = "/var/lib/cwa/forecast.db"
        retention_days = 30
        interval_hours = 6

        [feed]
        authorization_token = "CWA-123"
        timeout_secs        = 10
      "#,
    )
    .unwrap();

    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/cwa/forecast.db"));
    assert_eq!(cfg.retention(), chrono::Duration::days(30));
    assert_eq!(cfg.interval(), Some(Duration::from_secs(6 * 3600)));
    assert_eq!(cfg.feed.authorization_token.as_deref(), Some("CWA-123"));
    assert_eq!(cfg.fetch_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.feed.url, DEFAULT_FEED_URL);
  }

  #[test]
  fn zero_interval_means_run_once() {
    let cfg = EtlConfig::from_toml("interval_hours = 0").unwrap();
    assert_eq!(cfg.interval(), None);
  }

  #[test]
  fn out_of_range_values_are_rejected() {
    let err = EtlConfig::from_toml("retention_days = 4000000000").unwrap_err();
    assert!(matches!(err, Error::OutOfRange { key: "retention_days", .. }));

    let err = EtlConfig::from_toml("interval_hours = 9223372036854775807")
      .unwrap_err();
    assert!(matches!(err, Error::OutOfRange { key: "interval_hours", .. }));

    let cfg = EtlConfig::from_toml("retention_days = 36500").unwrap();
    assert_eq!(cfg.retention(), chrono::Duration::days(36_500));
  }

  #[test]
  fn interval_overflow_is_not_a_panic() {
    let cfg = EtlConfig { interval_hours: Some(u64::MAX), ..Default::default() };
    assert_eq!(cfg.interval(), None);
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn missing_file_uses_defaults() {
    let cfg = EtlConfig::load(Path::new("/nonexistent/cwa-etl.toml")).unwrap();
    assert_eq!(cfg.retention_days, 365);
  }
}
