//! The CWA forecast ETL pipeline.
//!
//! Pulls the county forecast feed, flattens it into slot records, resolves
//! location names against `dim_location`, and reconciles the result into a
//! [`ForecastStore`](cwa_core::store::ForecastStore) with idempotent upserts
//! and time-based retention.

pub mod config;
pub mod error;
pub mod job;
pub mod reconcile;
pub mod resolve;
pub mod schedule;

pub use config::{EtlConfig, FeedConfig};
pub use error::{Error, Result};
pub use job::{JobDriver, RunOutcome, RunReport};
pub use reconcile::{ReconcileReport, Reconciler};
pub use resolve::{LocationResolver, Resolution};
