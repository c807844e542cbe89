use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::nav::nav_errors::Result;
use crate::nav::nav_model::{LatestNav, NavHistoryEntry};

pub trait NavRepositoryTrait: Send + Sync {
    fn get_latest(&self, scheme_code: i32) -> Result<Option<LatestNav>>;

    /// Upsert the latest-NAV row. A write whose `as_of` is older than the
    /// stored row must not regress it; equal dates take the newer write.
    fn upsert_latest(&self, nav: &LatestNav) -> Result<()>;

    /// Insert-or-update one history entry, deduplicated by date, keeping at
    /// most `cap` entries per scheme (oldest evicted).
    fn upsert_history_entry(
        &self,
        scheme_code: i32,
        date: NaiveDate,
        nav: Decimal,
        cap: usize,
    ) -> Result<()>;

    /// Newest-first history, at most `last_n` entries.
    fn get_history(&self, scheme_code: i32, last_n: usize) -> Result<Vec<NavHistoryEntry>>;

    /// Most recent entry dated on or before `date`, if any.
    fn get_nav_on_or_before(
        &self,
        scheme_code: i32,
        date: NaiveDate,
    ) -> Result<Option<NavHistoryEntry>>;
}

/// Where the refresh engine learns which schemes the books currently
/// reference. Implemented by the portfolio repository.
pub trait ActiveSchemeSource: Send + Sync {
    /// Distinct scheme codes referenced by any non-empty position.
    fn active_scheme_codes(&self) -> Result<Vec<i32>>;
}

#[async_trait]
pub trait NavServiceTrait: Send + Sync {
    /// Stored latest NAV, read-through to the provider on a miss. The
    /// provider result is written to both stores before it is returned.
    async fn get_latest(&self, scheme_code: i32) -> Result<LatestNav>;

    /// Stored latest NAV only; never touches the provider.
    fn get_cached_latest(&self, scheme_code: i32) -> Result<Option<LatestNav>>;

    /// Fetch from the provider and persist latest + history. Used by the
    /// refresh engine and by read-through misses.
    async fn fetch_and_store_latest(&self, scheme_code: i32) -> Result<LatestNav>;

    fn get_history(&self, scheme_code: i32, last_n: usize) -> Result<Vec<NavHistoryEntry>>;

    fn get_nav_on_or_before(
        &self,
        scheme_code: i32,
        date: NaiveDate,
    ) -> Result<Option<NavHistoryEntry>>;
}
