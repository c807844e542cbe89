use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use std::sync::Arc;

use crate::nav::nav_errors::Result;
use crate::nav::nav_model::{LatestNav, NavHistoryEntry};
use crate::nav::nav_traits::{NavRepositoryTrait, NavServiceTrait};
use crate::nav::providers::QuoteProviderTrait;
use crate::schemes::SchemeRepositoryTrait;

pub struct NavService {
    repository: Arc<dyn NavRepositoryTrait>,
    provider: Arc<dyn QuoteProviderTrait>,
    scheme_repository: Arc<dyn SchemeRepositoryTrait>,
    history_cap: usize,
}

impl NavService {
    pub fn new(
        repository: Arc<dyn NavRepositoryTrait>,
        provider: Arc<dyn QuoteProviderTrait>,
        scheme_repository: Arc<dyn SchemeRepositoryTrait>,
        history_cap: usize,
    ) -> Self {
        Self {
            repository,
            provider,
            scheme_repository,
            history_cap: history_cap.max(1),
        }
    }
}

#[async_trait]
impl NavServiceTrait for NavService {
    async fn get_latest(&self, scheme_code: i32) -> Result<LatestNav> {
        if let Some(stored) = self.repository.get_latest(scheme_code)? {
            return Ok(stored);
        }
        debug!("Latest NAV cache miss for scheme {}", scheme_code);
        self.fetch_and_store_latest(scheme_code).await
    }

    fn get_cached_latest(&self, scheme_code: i32) -> Result<Option<LatestNav>> {
        self.repository.get_latest(scheme_code)
    }

    async fn fetch_and_store_latest(&self, scheme_code: i32) -> Result<LatestNav> {
        let quote = self.provider.fetch_latest(scheme_code).await?;

        let latest = LatestNav {
            scheme_code,
            nav: quote.nav,
            as_of: quote.date,
            updated_at: Utc::now().naive_utc(),
        };
        self.repository.upsert_latest(&latest)?;
        self.repository
            .upsert_history_entry(scheme_code, quote.date, quote.nav, self.history_cap)?;

        // Keep the catalog in step with anything the books reference. The
        // catalog never gates the NAV itself.
        if let Err(err) = self.scheme_repository.upsert(&quote.meta) {
            warn!("Failed to record scheme {} in catalog: {}", scheme_code, err);
        }

        Ok(latest)
    }

    fn get_history(&self, scheme_code: i32, last_n: usize) -> Result<Vec<NavHistoryEntry>> {
        self.repository.get_history(scheme_code, last_n)
    }

    fn get_nav_on_or_before(
        &self,
        scheme_code: i32,
        date: NaiveDate,
    ) -> Result<Option<NavHistoryEntry>> {
        self.repository.get_nav_on_or_before(scheme_code, date)
    }
}
