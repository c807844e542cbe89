use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::db::create_test_pool;
use crate::nav::nav_errors::{NavError, Result as NavResult};
use crate::nav::nav_model::{LatestNav, NavHistoryEntry};
use crate::nav::NavServiceTrait;
use crate::portfolios::portfolios_errors::PortfolioError;
use crate::portfolios::portfolios_model::{Position, PositionWrite};
use crate::portfolios::portfolios_repository::PortfolioRepository;
use crate::portfolios::portfolios_service::PortfolioService;
use crate::portfolios::portfolios_traits::{PortfolioRepositoryTrait, PortfolioServiceTrait};
use crate::transactions::{TransactionRepository, TransactionRepositoryTrait, TransactionType};

const USER: &str = "user-1";
const SCHEME: i32 = 152075;

/// NAV source with a settable value; lets tests move the market between
/// orders without a provider.
struct StubNavService {
    nav: Mutex<Decimal>,
    available: AtomicBool,
}

impl StubNavService {
    fn at(nav: Decimal) -> Arc<Self> {
        Arc::new(StubNavService {
            nav: Mutex::new(nav),
            available: AtomicBool::new(true),
        })
    }

    fn set_nav(&self, nav: Decimal) {
        *self.nav.lock().unwrap() = nav;
    }

    fn set_unavailable(&self) {
        self.available.store(false, Ordering::SeqCst);
    }

    fn latest(&self, scheme_code: i32) -> NavResult<LatestNav> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(NavError::Unavailable(scheme_code));
        }
        Ok(LatestNav {
            scheme_code,
            nav: *self.nav.lock().unwrap(),
            as_of: NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
            updated_at: Utc::now().naive_utc(),
        })
    }
}

#[async_trait]
impl NavServiceTrait for StubNavService {
    async fn get_latest(&self, scheme_code: i32) -> NavResult<LatestNav> {
        self.latest(scheme_code)
    }

    fn get_cached_latest(&self, scheme_code: i32) -> NavResult<Option<LatestNav>> {
        Ok(self.latest(scheme_code).ok())
    }

    async fn fetch_and_store_latest(&self, scheme_code: i32) -> NavResult<LatestNav> {
        self.latest(scheme_code)
    }

    fn get_history(&self, _scheme_code: i32, _last_n: usize) -> NavResult<Vec<NavHistoryEntry>> {
        Ok(Vec::new())
    }

    fn get_nav_on_or_before(
        &self,
        _scheme_code: i32,
        _date: NaiveDate,
    ) -> NavResult<Option<NavHistoryEntry>> {
        Ok(None)
    }
}

struct Fixture {
    service: Arc<PortfolioService>,
    nav: Arc<StubNavService>,
    repository: Arc<PortfolioRepository>,
    transactions: Arc<TransactionRepository>,
}

fn fixture(nav: Decimal) -> Fixture {
    let pool = create_test_pool();
    let repository = Arc::new(PortfolioRepository::new(pool.clone()));
    let transactions = Arc::new(TransactionRepository::new(pool));
    let stub = StubNavService::at(nav);
    let service = Arc::new(PortfolioService::new(
        repository.clone(),
        transactions.clone(),
        stub.clone(),
    ));
    Fixture {
        service,
        nav: stub,
        repository,
        transactions,
    }
}

#[tokio::test]
async fn buy_then_sell_updates_position_and_realizes_pl() {
    let fx = fixture(dec!(10.00));

    let bought = fx.service.buy(USER, SCHEME, dec!(100)).await.unwrap();
    assert_eq!(bought.position.total_units, dec!(100));
    assert_eq!(bought.position.invested_value, dec!(1000));
    assert_eq!(bought.position.avg_nav, dec!(10));
    assert_eq!(bought.transaction.tx_type, TransactionType::Buy);

    let log = fx.transactions.list_for_portfolio(&bought.portfolio_id).unwrap();
    assert_eq!(log.len(), 1);

    fx.nav.set_nav(dec!(12.50));
    let sold = fx.service.sell(USER, SCHEME, dec!(40)).await.unwrap();

    assert_eq!(sold.realized_pl, dec!(100.00));
    assert_eq!(sold.remaining_units, dec!(60));
    let position = sold.position.unwrap();
    assert_eq!(position.total_units, dec!(60));
    assert_eq!(position.invested_value, dec!(600.00));
    assert_eq!(position.avg_nav, dec!(10.00));

    let log = fx.transactions.list_for_portfolio(&sold.portfolio_id).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].realized_pl, Some(dec!(100.00)));
}

#[tokio::test]
async fn sell_across_lots_consumes_fifo_and_preserves_avg_nav() {
    let fx = fixture(dec!(10));

    fx.service.buy(USER, SCHEME, dec!(50)).await.unwrap();
    fx.nav.set_nav(dec!(14));
    fx.service.buy(USER, SCHEME, dec!(50)).await.unwrap();

    fx.nav.set_nav(dec!(15));
    let sold = fx.service.sell(USER, SCHEME, dec!(70)).await.unwrap();

    // 50 consumed at 10, 20 at 14.
    assert_eq!(sold.realized_pl, dec!(270));
    assert_eq!(sold.remaining_units, dec!(30));

    // avg_nav is preserved across the SELL: (500 + 700) / 100 = 12.
    let position = sold.position.unwrap();
    assert_eq!(position.avg_nav, dec!(12));
    assert_eq!(position.invested_value, dec!(360));
}

#[tokio::test]
async fn oversell_is_rejected_without_side_effects() {
    let fx = fixture(dec!(10));

    let bought = fx.service.buy(USER, SCHEME, dec!(30)).await.unwrap();

    let err = fx.service.sell(USER, SCHEME, dec!(31)).await.unwrap_err();
    assert!(matches!(err, PortfolioError::InsufficientUnits { .. }));

    // No transaction appended, position untouched.
    let log = fx.transactions.list_for_portfolio(&bought.portfolio_id).unwrap();
    assert_eq!(log.len(), 1);
    let position = fx.repository.get_position(&bought.portfolio_id).unwrap().unwrap();
    assert_eq!(position.total_units, dec!(30));
}

#[tokio::test]
async fn selling_everything_at_cost_realizes_zero_and_clears_the_position() {
    let fx = fixture(dec!(10));

    let bought = fx.service.buy(USER, SCHEME, dec!(100)).await.unwrap();
    let sold = fx.service.sell(USER, SCHEME, dec!(100)).await.unwrap();

    assert_eq!(sold.realized_pl, dec!(0));
    assert_eq!(sold.remaining_units, dec!(0));
    assert!(sold.position.is_none());
    assert!(fx.repository.get_position(&bought.portfolio_id).unwrap().is_none());

    // The portfolio row and its log survive the empty position.
    assert!(fx
        .repository
        .get_by_user_scheme(USER, SCHEME)
        .unwrap()
        .is_some());
    assert_eq!(fx.transactions.count_for_portfolio(&bought.portfolio_id).unwrap(), 2);

    // Which is exactly why REMOVE must refuse.
    let err = fx.service.remove(USER, SCHEME).await.unwrap_err();
    assert!(matches!(err, PortfolioError::HasTransactions(_)));
}

#[tokio::test]
async fn remove_succeeds_only_for_an_empty_portfolio_with_empty_log() {
    let fx = fixture(dec!(10));

    // A portfolio that never traded (created directly, not via BUY).
    fx.repository
        .get_or_create(USER, SCHEME, Utc::now().naive_utc(), dec!(10))
        .unwrap();

    fx.service.remove(USER, SCHEME).await.unwrap();
    assert!(fx.repository.get_by_user_scheme(USER, SCHEME).unwrap().is_none());

    let err = fx.service.remove(USER, SCHEME).await.unwrap_err();
    assert!(matches!(err, PortfolioError::NoPosition(_)));
}

#[tokio::test]
async fn buy_with_nav_unavailable_has_no_side_effects() {
    let fx = fixture(dec!(10));
    fx.nav.set_unavailable();

    let err = fx.service.buy(USER, SCHEME, dec!(5)).await.unwrap_err();
    assert!(matches!(err, PortfolioError::Nav(NavError::Unavailable(_))));

    assert!(fx.repository.get_by_user_scheme(USER, SCHEME).unwrap().is_none());
}

#[tokio::test]
async fn invalid_orders_are_rejected_up_front() {
    let fx = fixture(dec!(10));

    let err = fx.service.buy(USER, SCHEME, dec!(0)).await.unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidInput(_)));

    let err = fx.service.buy(USER, 42, dec!(1)).await.unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidInput(_)));

    let err = fx.service.sell(USER, SCHEME, dec!(-1)).await.unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidInput(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_buys_linearize_on_one_portfolio() {
    let fx = fixture(dec!(20));

    let a = {
        let service = fx.service.clone();
        tokio::spawn(async move { service.buy(USER, SCHEME, dec!(10)).await })
    };
    let b = {
        let service = fx.service.clone();
        tokio::spawn(async move { service.buy(USER, SCHEME, dec!(5)).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // Exactly one portfolio exists for the pair.
    let portfolios = fx.repository.list_portfolios(USER).unwrap();
    assert_eq!(portfolios.len(), 1);
    let portfolio_id = portfolios[0].id.clone();

    // Both serializations agree on the final aggregate.
    let position = fx.repository.get_position(&portfolio_id).unwrap().unwrap();
    assert_eq!(position.total_units, dec!(15));
    assert_eq!(position.invested_value, dec!(300));
    assert_eq!(position.avg_nav, dec!(20));

    let log = fx.transactions.list_for_portfolio(&portfolio_id).unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|tx| tx.tx_type == TransactionType::Buy));
}

#[tokio::test]
async fn corrupted_position_cache_is_rebuilt_from_the_log() {
    let fx = fixture(dec!(10));

    let bought = fx.service.buy(USER, SCHEME, dec!(100)).await.unwrap();

    // Tear the cache the way a failed position write after a committed
    // append would.
    fx.repository
        .write_position(PositionWrite::Upsert(Position {
            portfolio_id: bought.portfolio_id.clone(),
            scheme_code: SCHEME,
            total_units: dec!(1),
            invested_value: dec!(1),
            avg_nav: dec!(1),
            updated_at: Utc::now().naive_utc(),
        }))
        .unwrap();

    // The next read reconciles against the replayed log.
    let holdings = fx.service.holdings(USER).unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].1.total_units, dec!(100));
    assert_eq!(holdings[0].1.invested_value, dec!(1000));

    let cached = fx.repository.get_position(&bought.portfolio_id).unwrap().unwrap();
    assert_eq!(cached.total_units, dec!(100));
    assert_eq!(cached.avg_nav, dec!(10));
}

#[tokio::test]
async fn repurchase_after_full_exit_starts_a_fresh_book() {
    let fx = fixture(dec!(10));

    fx.service.buy(USER, SCHEME, dec!(100)).await.unwrap();
    fx.nav.set_nav(dec!(20));
    fx.service.sell(USER, SCHEME, dec!(100)).await.unwrap();

    fx.nav.set_nav(dec!(40));
    let rebought = fx.service.buy(USER, SCHEME, dec!(10)).await.unwrap();

    assert_eq!(rebought.position.total_units, dec!(10));
    assert_eq!(rebought.position.avg_nav, dec!(40));
    assert_eq!(rebought.position.invested_value, dec!(400));
}
