use async_trait::async_trait;

use crate::nav::nav_errors::Result;
use crate::nav::nav_model::NavHistoryEntry;
use crate::nav::providers::models::{FundListing, LatestQuote};

/// Read-only client against the external NAV provider. Implementations
/// retry transient failures internally and never write to the NAV store.
#[async_trait]
pub trait QuoteProviderTrait: Send + Sync {
    /// Latest published NAV for one scheme, with catalog metadata.
    async fn fetch_latest(&self, scheme_code: i32) -> Result<LatestQuote>;

    /// Full published history for one scheme, newest-first.
    async fn fetch_history(&self, scheme_code: i32) -> Result<Vec<NavHistoryEntry>>;

    /// The provider's complete fund listing.
    async fn list_funds(&self) -> Result<Vec<FundListing>>;
}
