use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::db::create_test_pool;
use crate::nav::nav_errors::{NavError, Result};
use crate::nav::nav_model::NavHistoryEntry;
use crate::nav::nav_repository::NavRepository;
use crate::nav::nav_service::NavService;
use crate::nav::nav_traits::NavServiceTrait;
use crate::nav::providers::models::{FundListing, LatestQuote};
use crate::nav::providers::QuoteProviderTrait;
use crate::schemes::{NewScheme, SchemeRepository, SchemeRepositoryTrait};

struct FakeProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeProvider {
    fn new() -> Self {
        FakeProvider {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        FakeProvider {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait]
impl QuoteProviderTrait for FakeProvider {
    async fn fetch_latest(&self, scheme_code: i32) -> Result<LatestQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NavError::Transport("connection refused".to_string()));
        }
        Ok(LatestQuote {
            scheme_code,
            nav: dec!(104.3583),
            date: NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
            meta: NewScheme {
                scheme_code,
                scheme_name: "Parag Parikh Flexi Cap Fund - Direct Growth".to_string(),
                fund_house: "PPFAS Mutual Fund".to_string(),
                scheme_type: "Open Ended".to_string(),
                scheme_category: "Equity Scheme - Flexi Cap Fund".to_string(),
            },
        })
    }

    async fn fetch_history(&self, _scheme_code: i32) -> Result<Vec<NavHistoryEntry>> {
        Ok(Vec::new())
    }

    async fn list_funds(&self) -> Result<Vec<FundListing>> {
        Ok(Vec::new())
    }
}

fn build(provider: FakeProvider) -> (NavService, Arc<FakeProvider>, Arc<SchemeRepository>) {
    let pool = create_test_pool();
    let provider = Arc::new(provider);
    let scheme_repository = Arc::new(SchemeRepository::new(pool.clone()));
    let service = NavService::new(
        Arc::new(NavRepository::new(pool)),
        provider.clone(),
        scheme_repository.clone(),
        30,
    );
    (service, provider, scheme_repository)
}

#[tokio::test]
async fn cache_miss_reads_through_and_fills_both_stores() {
    let (service, provider, schemes) = build(FakeProvider::new());

    assert!(service.get_cached_latest(122639).unwrap().is_none());

    let latest = service.get_latest(122639).await.unwrap();
    assert_eq!(latest.nav, dec!(104.3583));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    // Latest store, history store and catalog all saw the fetch.
    assert!(service.get_cached_latest(122639).unwrap().is_some());
    let history = service.get_history(122639, 10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].nav, dec!(104.3583));
    let scheme = schemes.get_by_code(122639).unwrap();
    assert_eq!(scheme.fund_house, "PPFAS Mutual Fund");

    // A second read is served from the store.
    service.get_latest(122639).await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn provider_failure_on_miss_leaves_no_state_behind() {
    let (service, provider, _schemes) = build(FakeProvider::failing());

    let err = service.get_latest(122639).await.unwrap_err();
    assert!(matches!(err, NavError::Transport(_)));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    assert!(service.get_cached_latest(122639).unwrap().is_none());
    assert!(service.get_history(122639, 10).unwrap().is_empty());
}
