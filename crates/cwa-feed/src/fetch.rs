//! Fetching the feed: request URL construction and a single timed GET.

use std::{future::Future, time::Duration};

use reqwest::{Client, Url};
use tracing::{error, info};

use crate::{
  error::{Error, FetchError, Result},
  payload::FeedPayload,
};

/// The 36-hour county forecast dataset.
pub const DEFAULT_FEED_URL: &str =
  "https://opendata.cwa.gov.tw/api/v1/rest/datastore/F-C0032-001";

const TOKEN_PARAM: &str = "Authorization";

/// Build the request URL: `base` plus the authorization token and sort
/// directive as query parameters. A missing or blank token is an error.
pub fn authorize_url(base: &str, token: Option<&str>, sort: &str) -> Result<Url> {
  let token = token
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::MissingToken)?;

  let mut url = Url::parse(base).map_err(|e| Error::InvalidUrl {
    url:    base.to_owned(),
    reason: e.to_string(),
  })?;
  url
    .query_pairs_mut()
    .append_pair(TOKEN_PARAM, token)
    .append_pair("sort", sort);
  Ok(url)
}

/// A copy of `url` with the authorization token masked, for logging.
pub fn redact_url(url: &Url) -> Url {
  let pairs: Vec<(String, String)> = url
    .query_pairs()
    .map(|(k, v)| {
      let v = if k == TOKEN_PARAM { "***".into() } else { v.into_owned() };
      (k.into_owned(), v)
    })
    .collect();

  let mut redacted = url.clone();
  redacted.query_pairs_mut().clear().extend_pairs(pairs);
  redacted
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// Where the pipeline gets its payload from. Implementations perform exactly
/// one attempt per call; retrying is left to the next scheduled run.
pub trait FeedSource: Send + Sync {
  fn fetch<'a>(
    &'a self,
    url: &'a Url,
  ) -> impl Future<Output = Result<FeedPayload, FetchError>> + Send + 'a;
}

/// HTTP implementation of [`FeedSource`].
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct FeedClient {
  client: Client,
}

impl FeedClient {
  /// `timeout` bounds the whole request, from connect to the last body byte.
  pub fn new(timeout: Duration) -> Result<Self, FetchError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(FetchError::Client)?;
    Ok(Self { client })
  }

  async fn fetch_inner(&self, url: &Url) -> Result<FeedPayload, FetchError> {
    let resp = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|e| FetchError::Transport(e.without_url()))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(FetchError::Status(status));
    }

    let body = resp
      .bytes()
      .await
      .map_err(|e| FetchError::Transport(e.without_url()))?;
    let payload: FeedPayload = serde_json::from_slice(&body)?;
    check_success(&payload)?;
    Ok(payload)
  }
}

fn check_success(payload: &FeedPayload) -> Result<(), FetchError> {
  match payload.success.as_deref() {
    None | Some("true") => Ok(()),
    Some(other) => Err(FetchError::Unsuccessful(other.to_owned())),
  }
}

impl FeedSource for FeedClient {
  async fn fetch(&self, url: &Url) -> Result<FeedPayload, FetchError> {
    let shown = redact_url(url);
    info!(url = %shown, "fetching forecast feed");

    let result = self.fetch_inner(url).await;
    if let Err(e) = &result {
      error!(url = %shown, error = %e, "forecast feed fetch failed");
    }
    result
  }
}
