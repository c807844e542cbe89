use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

use crate::nav::nav_errors::{NavError, Result as NavResult};
use crate::nav::nav_model::{LatestNav, NavHistoryEntry};
use crate::nav::NavServiceTrait;
use crate::portfolios::portfolios_errors::{PortfolioError, Result as PortfolioResult};
use crate::portfolios::portfolios_model::{BuyOutcome, Portfolio, Position, SellOutcome};
use crate::portfolios::PortfolioServiceTrait;
use crate::schemes::schemes_errors::{Result as SchemeResult, SchemeError};
use crate::schemes::{NewScheme, Scheme, SchemeServiceTrait};
use crate::transactions::transactions_errors::Result as TxResult;
use crate::transactions::{
    Transaction, TransactionFilter, TransactionPage, TransactionRepositoryTrait, TransactionType,
};
use crate::valuation::valuation_model::{HistoryRange, HISTORY_MAX_DAYS};
use crate::valuation::valuation_service::ValuationService;
use crate::valuation::valuation_traits::ValuationServiceTrait;
use crate::valuation::ValuationError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ts(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(10, 0, 0).unwrap()
}

struct StubBooks {
    holdings: Vec<(Portfolio, Position)>,
    portfolios: Vec<Portfolio>,
    logs: HashMap<String, Vec<Transaction>>,
}

#[async_trait]
impl PortfolioServiceTrait for StubBooks {
    async fn buy(&self, _: &str, _: i32, _: Decimal) -> PortfolioResult<BuyOutcome> {
        Err(PortfolioError::InvalidInput("not supported".to_string()))
    }

    async fn sell(&self, _: &str, _: i32, _: Decimal) -> PortfolioResult<SellOutcome> {
        Err(PortfolioError::InvalidInput("not supported".to_string()))
    }

    async fn remove(&self, _: &str, _: i32) -> PortfolioResult<()> {
        Err(PortfolioError::InvalidInput("not supported".to_string()))
    }

    fn holdings(&self, _: &str) -> PortfolioResult<Vec<(Portfolio, Position)>> {
        Ok(self.holdings.clone())
    }

    fn portfolios(&self, _: &str) -> PortfolioResult<Vec<Portfolio>> {
        Ok(self.portfolios.clone())
    }
}

impl TransactionRepositoryTrait for StubBooks {
    fn list_for_portfolio(&self, portfolio_id: &str) -> TxResult<Vec<Transaction>> {
        Ok(self.logs.get(portfolio_id).cloned().unwrap_or_default())
    }

    fn count_for_portfolio(&self, portfolio_id: &str) -> TxResult<i64> {
        Ok(self.logs.get(portfolio_id).map_or(0, |log| log.len()) as i64)
    }

    fn search(&self, _: &str, filter: &TransactionFilter) -> TxResult<TransactionPage> {
        Ok(TransactionPage {
            items: Vec::new(),
            total: 0,
            page: filter.page,
            limit: filter.limit,
        })
    }
}

struct StubNav {
    latest: HashMap<i32, LatestNav>,
    history: HashMap<i32, Vec<NavHistoryEntry>>,
}

#[async_trait]
impl NavServiceTrait for StubNav {
    async fn get_latest(&self, scheme_code: i32) -> NavResult<LatestNav> {
        self.latest
            .get(&scheme_code)
            .cloned()
            .ok_or(NavError::Unavailable(scheme_code))
    }

    fn get_cached_latest(&self, scheme_code: i32) -> NavResult<Option<LatestNav>> {
        Ok(self.latest.get(&scheme_code).cloned())
    }

    async fn fetch_and_store_latest(&self, scheme_code: i32) -> NavResult<LatestNav> {
        self.get_latest(scheme_code).await
    }

    fn get_history(&self, scheme_code: i32, _last_n: usize) -> NavResult<Vec<NavHistoryEntry>> {
        Ok(self.history.get(&scheme_code).cloned().unwrap_or_default())
    }

    fn get_nav_on_or_before(
        &self,
        scheme_code: i32,
        date: NaiveDate,
    ) -> NavResult<Option<NavHistoryEntry>> {
        Ok(self
            .history
            .get(&scheme_code)
            .and_then(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.date <= date)
                    .max_by_key(|entry| entry.date)
            })
            .cloned())
    }
}

struct StubCatalog;

impl SchemeServiceTrait for StubCatalog {
    fn get_scheme(&self, code: i32) -> SchemeResult<Scheme> {
        if code == 152075 {
            Ok(Scheme {
                scheme_code: code,
                scheme_name: "Test Growth Fund".to_string(),
                fund_house: "Test AMC".to_string(),
                scheme_type: "Open Ended".to_string(),
                scheme_category: "Equity".to_string(),
            })
        } else {
            Err(SchemeError::NotFound(code))
        }
    }

    fn search_schemes(&self, _: &str) -> SchemeResult<Vec<Scheme>> {
        Ok(Vec::new())
    }

    fn record_scheme(&self, scheme: NewScheme) -> SchemeResult<Scheme> {
        Ok(Scheme {
            scheme_code: scheme.scheme_code,
            scheme_name: scheme.scheme_name,
            fund_house: scheme.fund_house,
            scheme_type: scheme.scheme_type,
            scheme_category: scheme.scheme_category,
        })
    }
}

fn portfolio(id: &str, scheme_code: i32, opened: NaiveDateTime) -> Portfolio {
    Portfolio {
        id: id.to_string(),
        user_id: "user-1".to_string(),
        scheme_code,
        opened_at: opened,
        opening_nav: dec!(10),
        created_at: opened,
    }
}

fn position(portfolio_id: &str, scheme_code: i32, units: Decimal, avg: Decimal) -> Position {
    Position {
        portfolio_id: portfolio_id.to_string(),
        scheme_code,
        total_units: units,
        invested_value: units * avg,
        avg_nav: avg,
        updated_at: Utc::now().naive_utc(),
    }
}

fn buy_tx(id: i64, portfolio_id: &str, units: Decimal, nav: Decimal, at: NaiveDateTime) -> Transaction {
    Transaction {
        id,
        portfolio_id: portfolio_id.to_string(),
        tx_type: TransactionType::Buy,
        units,
        nav,
        amount: units * nav,
        realized_pl: None,
        executed_at: at,
        created_at: at,
    }
}

fn latest(scheme_code: i32, nav: Decimal, as_of: NaiveDate) -> LatestNav {
    LatestNav {
        scheme_code,
        nav,
        as_of,
        updated_at: Utc::now().naive_utc(),
    }
}

fn entry(y: i32, m: u32, d: u32, nav: Decimal) -> NavHistoryEntry {
    NavHistoryEntry { date: date(y, m, d), nav }
}

fn service(books: StubBooks, nav: StubNav) -> ValuationService {
    let books = Arc::new(books);
    ValuationService::new(
        books.clone(),
        books,
        Arc::new(nav),
        Arc::new(StubCatalog),
    )
}

#[tokio::test]
async fn valuation_joins_positions_with_latest_navs() {
    let p1 = portfolio("p1", 152075, ts(2024, 1, 5));
    let books = StubBooks {
        holdings: vec![(p1.clone(), position("p1", 152075, dec!(100), dec!(10)))],
        portfolios: vec![p1],
        logs: HashMap::new(),
    };
    let nav = StubNav {
        latest: HashMap::from([(152075, latest(152075, dec!(12.5), date(2024, 1, 17)))]),
        history: HashMap::new(),
    };

    let valuation = service(books, nav).portfolio_value("user-1").await.unwrap();

    assert_eq!(valuation.positions.len(), 1);
    let pos = &valuation.positions[0];
    assert_eq!(pos.scheme_name.as_deref(), Some("Test Growth Fund"));
    assert_eq!(pos.current_nav, dec!(12.5));
    assert_eq!(pos.current_value, dec!(1250));
    assert_eq!(pos.unrealized_pl, dec!(250));
    assert!(!pos.nav_missing);

    assert_eq!(valuation.totals.invested_value, dec!(1000));
    assert_eq!(valuation.totals.current_value, dec!(1250));
    assert_eq!(valuation.totals.unrealized_pl, dec!(250));
    assert_eq!(valuation.as_of, date(2024, 1, 17));
}

#[tokio::test]
async fn missing_nav_degrades_one_position_without_failing_the_portfolio() {
    let p1 = portfolio("p1", 152075, ts(2024, 1, 5));
    let p2 = portfolio("p2", 100999, ts(2024, 1, 6));
    let books = StubBooks {
        holdings: vec![
            (p1.clone(), position("p1", 152075, dec!(100), dec!(10))),
            (p2.clone(), position("p2", 100999, dec!(50), dec!(20))),
        ],
        portfolios: vec![p1, p2],
        logs: HashMap::new(),
    };
    // Only scheme 152075 has a NAV.
    let nav = StubNav {
        latest: HashMap::from([(152075, latest(152075, dec!(11), date(2024, 1, 17)))]),
        history: HashMap::new(),
    };

    let valuation = service(books, nav).portfolio_value("user-1").await.unwrap();
    assert_eq!(valuation.positions.len(), 2);

    let degraded = valuation
        .positions
        .iter()
        .find(|p| p.scheme_code == 100999)
        .unwrap();
    assert!(degraded.nav_missing);
    // Substituted avg cost: value equals invested, unrealized is zero.
    assert_eq!(degraded.current_nav, dec!(20));
    assert_eq!(degraded.current_value, dec!(1000));
    assert_eq!(degraded.unrealized_pl, dec!(0));

    let live = valuation
        .positions
        .iter()
        .find(|p| p.scheme_code == 152075)
        .unwrap();
    assert!(!live.nav_missing);
}

#[tokio::test]
async fn history_uses_nav_at_or_before_each_date_and_skips_preopen_days() {
    // Held from Jan 5; NAV history only for Jan 5-7. Window Jan 4-10.
    let p1 = portfolio("p1", 152075, ts(2024, 1, 5));
    let books = StubBooks {
        holdings: vec![(p1.clone(), position("p1", 152075, dec!(100), dec!(10)))],
        portfolios: vec![p1],
        logs: HashMap::from([(
            "p1".to_string(),
            vec![buy_tx(1, "p1", dec!(100), dec!(10), ts(2024, 1, 5))],
        )]),
    };
    let nav = StubNav {
        latest: HashMap::new(),
        history: HashMap::from([(
            152075,
            vec![
                entry(2024, 1, 5, dec!(10.0)),
                entry(2024, 1, 6, dec!(10.2)),
                entry(2024, 1, 7, dec!(10.4)),
            ],
        )]),
    };

    let points = service(books, nav)
        .portfolio_history(
            "user-1",
            HistoryRange::Between(date(2024, 1, 4), date(2024, 1, 10)),
        )
        .unwrap();

    assert_eq!(points.len(), 7);

    // Jan 4: position not yet open, contributes nothing.
    assert_eq!(points[0].date, date(2024, 1, 4));
    assert_eq!(points[0].total_value, dec!(0));

    // Jan 5-7: the day's own NAV.
    assert_eq!(points[1].total_value, dec!(1000.0));
    assert_eq!(points[2].total_value, dec!(1020.0));
    assert_eq!(points[3].total_value, dec!(1040.0));

    // Jan 8-10: carried forward from Jan 7.
    for point in &points[4..] {
        assert_eq!(point.total_value, dec!(1040.0));
        assert_eq!(point.unrealized_pl, dec!(40.0));
    }
}

#[tokio::test]
async fn history_falls_back_to_avg_nav_before_any_entry() {
    let p1 = portfolio("p1", 152075, ts(2024, 1, 5));
    let books = StubBooks {
        holdings: vec![(p1.clone(), position("p1", 152075, dec!(100), dec!(10)))],
        portfolios: vec![p1],
        logs: HashMap::from([(
            "p1".to_string(),
            vec![buy_tx(1, "p1", dec!(100), dec!(10), ts(2024, 1, 5))],
        )]),
    };
    // History starts well after the position opened.
    let nav = StubNav {
        latest: HashMap::new(),
        history: HashMap::from([(152075, vec![entry(2024, 1, 9, dec!(12))])]),
    };

    let points = service(books, nav)
        .portfolio_history(
            "user-1",
            HistoryRange::Between(date(2024, 1, 5), date(2024, 1, 9)),
        )
        .unwrap();

    // Jan 5-8 value at avg cost, Jan 9 at the first real entry.
    for point in &points[..4] {
        assert_eq!(point.total_value, dec!(1000));
        assert_eq!(point.unrealized_pl, dec!(0));
    }
    assert_eq!(points[4].total_value, dec!(1200));
}

#[tokio::test]
async fn history_reflects_mid_window_sells() {
    let p1 = portfolio("p1", 152075, ts(2024, 1, 5));
    let mut sell = buy_tx(2, "p1", dec!(60), dec!(11), ts(2024, 1, 8));
    sell.tx_type = TransactionType::Sell;
    sell.realized_pl = Some(dec!(60));

    let books = StubBooks {
        holdings: vec![(p1.clone(), position("p1", 152075, dec!(40), dec!(10)))],
        portfolios: vec![p1],
        logs: HashMap::from([(
            "p1".to_string(),
            vec![buy_tx(1, "p1", dec!(100), dec!(10), ts(2024, 1, 5)), sell],
        )]),
    };
    let nav = StubNav {
        latest: HashMap::new(),
        history: HashMap::from([(152075, vec![entry(2024, 1, 5, dec!(10))])]),
    };

    let points = service(books, nav)
        .portfolio_history(
            "user-1",
            HistoryRange::Between(date(2024, 1, 7), date(2024, 1, 9)),
        )
        .unwrap();

    // 100 units through Jan 7, 40 units from the Jan 8 sell onwards.
    assert_eq!(points[0].total_value, dec!(1000));
    assert_eq!(points[1].total_value, dec!(400));
    assert_eq!(points[2].total_value, dec!(400));
}

#[test]
fn history_range_validation() {
    let books = StubBooks {
        holdings: Vec::new(),
        portfolios: Vec::new(),
        logs: HashMap::new(),
    };
    let nav = StubNav {
        latest: HashMap::new(),
        history: HashMap::new(),
    };
    let service = service(books, nav);

    let err = service
        .portfolio_history("user-1", HistoryRange::Days(HISTORY_MAX_DAYS + 1))
        .unwrap_err();
    assert!(matches!(err, ValuationError::InvalidRange(_)));

    let err = service
        .portfolio_history(
            "user-1",
            HistoryRange::Between(date(2024, 2, 1), date(2024, 1, 1)),
        )
        .unwrap_err();
    assert!(matches!(err, ValuationError::InvalidRange(_)));

    // Default window succeeds on an empty book.
    let points = service.portfolio_history("user-1", HistoryRange::Days(0)).unwrap();
    assert_eq!(points.len(), 30);
}
