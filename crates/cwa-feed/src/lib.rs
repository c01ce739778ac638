//! The CWA forecast feed: wire types, fetching, and normalization.
//!
//! Converts the nested `F-C0032-001` payload into flat
//! [`cwa_core::forecast::ForecastRecord`]s. Normalization is pure and
//! synchronous; fetching goes through the [`FeedSource`] seam.
//!
//! # Quick start
//!
//! ```no_run
//! use cwa_feed::{FeedClient, FeedSource, authorize_url, normalize};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let url = authorize_url(cwa_feed::DEFAULT_FEED_URL, Some("CWA-TOKEN"), "time")?;
//! let client = FeedClient::new(Duration::from_secs(30))?;
//! let payload = client.fetch(&url).await?;
//! let records = normalize(&payload);
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
mod fetch;
mod normalize;
pub mod payload;

pub use error::{Error, FetchError, Result};
pub use fetch::{
  DEFAULT_FEED_URL, FeedClient, FeedSource, authorize_url, redact_url,
};
pub use normalize::normalize;
pub use payload::FeedPayload;
