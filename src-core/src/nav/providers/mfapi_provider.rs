use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::nav::nav_errors::{NavError, Result};
use crate::nav::nav_model::NavHistoryEntry;
use crate::nav::providers::models::{FundEnvelope, FundListing, LatestQuote};
use crate::nav::providers::quote_provider::QuoteProviderTrait;

/// Client for the mfapi.in-style quote feed. Read-only: it parses and
/// returns values, the NAV store is written elsewhere.
pub struct MfApiProvider {
    client: Client,
    base_url: String,
    retry_max: u32,
}

impl MfApiProvider {
    pub fn new(base_url: &str, timeout: Duration, retry_max: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| NavError::Transport(e.to_string()))?;

        Ok(MfApiProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_max: retry_max.max(1),
        })
    }

    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        url: String,
        scheme_code: Option<i32>,
    ) -> Result<T> {
        let mut attempt: u32 = 0;
        loop {
            match self.try_get::<T>(&url, scheme_code).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt + 1 < self.retry_max && is_retryable(&err) => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_secs(1u64 << attempt);
                    warn!(
                        "Provider call {} failed (attempt {}/{}): {}; retrying in {:?}",
                        url,
                        attempt + 1,
                        self.retry_max,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &str, scheme_code: Option<i32>) -> Result<T> {
        let response = self.client.get(url).send().await?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| NavError::Parse(e.to_string())),
            StatusCode::NOT_FOUND => match scheme_code {
                Some(code) => Err(NavError::NotFound(code)),
                None => Err(NavError::Transport("not found".to_string())),
            },
            StatusCode::TOO_MANY_REQUESTS => Err(NavError::RateLimited),
            status => Err(NavError::Transport(format!("unexpected status {}", status))),
        }
    }
}

fn is_retryable(err: &NavError) -> bool {
    matches!(
        err,
        NavError::Transport(_) | NavError::Timeout | NavError::Parse(_) | NavError::RateLimited
    )
}

#[async_trait]
impl QuoteProviderTrait for MfApiProvider {
    async fn fetch_latest(&self, scheme_code: i32) -> Result<LatestQuote> {
        let url = format!("{}/mf/{}/latest", self.base_url, scheme_code);
        let envelope: FundEnvelope = self.get_with_retry(url, Some(scheme_code)).await?;

        let record = envelope
            .data
            .first()
            .ok_or(NavError::Unavailable(scheme_code))?;
        let entry = record.parse()?;

        debug!(
            "Fetched latest NAV for scheme {}: {} as of {}",
            scheme_code, entry.nav, entry.date
        );

        Ok(LatestQuote {
            scheme_code,
            nav: entry.nav,
            date: entry.date,
            meta: envelope.meta.to_new_scheme(scheme_code),
        })
    }

    async fn fetch_history(&self, scheme_code: i32) -> Result<Vec<NavHistoryEntry>> {
        let url = format!("{}/mf/{}", self.base_url, scheme_code);
        let envelope: FundEnvelope = self.get_with_retry(url, Some(scheme_code)).await?;

        let mut entries = Vec::with_capacity(envelope.data.len());
        for record in &envelope.data {
            match record.parse() {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!("Skipping malformed history row for {}: {}", scheme_code, err)
                }
            }
        }
        Ok(entries)
    }

    async fn list_funds(&self) -> Result<Vec<FundListing>> {
        let url = format!("{}/mf", self.base_url);
        self.get_with_retry(url, None).await
    }
}
