use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::nav::{NavHistoryEntry, NavServiceTrait};
use crate::portfolios::lots;
use crate::portfolios::PortfolioServiceTrait;
use crate::schemes::SchemeServiceTrait;
use crate::transactions::TransactionRepositoryTrait;
use crate::valuation::valuation_errors::{Result, ValuationError};
use crate::valuation::valuation_traits::ValuationServiceTrait;
use crate::valuation::valuation_model::{
    HistoryPoint, HistoryRange, PortfolioValuation, PositionValuation, ValuationTotals,
    HISTORY_DEFAULT_DAYS, HISTORY_MAX_DAYS,
};

pub struct ValuationService {
    portfolio_service: Arc<dyn PortfolioServiceTrait>,
    transactions: Arc<dyn TransactionRepositoryTrait>,
    nav_service: Arc<dyn NavServiceTrait>,
    scheme_service: Arc<dyn SchemeServiceTrait>,
}

impl ValuationService {
    pub fn new(
        portfolio_service: Arc<dyn PortfolioServiceTrait>,
        transactions: Arc<dyn TransactionRepositoryTrait>,
        nav_service: Arc<dyn NavServiceTrait>,
        scheme_service: Arc<dyn SchemeServiceTrait>,
    ) -> Self {
        Self {
            portfolio_service,
            transactions,
            nav_service,
            scheme_service,
        }
    }

    fn resolve_range(range: HistoryRange) -> Result<(NaiveDate, NaiveDate)> {
        let (start, end) = match range {
            HistoryRange::Days(days) => {
                let days = if days == 0 { HISTORY_DEFAULT_DAYS } else { days };
                if days > HISTORY_MAX_DAYS {
                    return Err(ValuationError::InvalidRange(format!(
                        "window of {} days exceeds the {}-day maximum",
                        days, HISTORY_MAX_DAYS
                    )));
                }
                let end = Utc::now().date_naive();
                (end - Duration::days(i64::from(days) - 1), end)
            }
            HistoryRange::Between(start, end) => (start, end),
        };

        if start > end {
            return Err(ValuationError::InvalidRange(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        if (end - start).num_days() >= i64::from(HISTORY_MAX_DAYS) {
            return Err(ValuationError::InvalidRange(format!(
                "range {}..{} exceeds the {}-day maximum",
                start, end, HISTORY_MAX_DAYS
            )));
        }
        Ok((start, end))
    }
}

/// Latest entry dated on or before `date` from an ascending series.
fn nav_at(entries: &[NavHistoryEntry], date: NaiveDate) -> Option<Decimal> {
    entries
        .iter()
        .take_while(|entry| entry.date <= date)
        .last()
        .map(|entry| entry.nav)
}

#[async_trait]
impl ValuationServiceTrait for ValuationService {
    async fn portfolio_value(&self, user_id: &str) -> Result<PortfolioValuation> {
        let holdings = self.portfolio_service.holdings(user_id)?;

        let mut positions = Vec::with_capacity(holdings.len());
        let mut totals = ValuationTotals {
            invested_value: Decimal::ZERO,
            current_value: Decimal::ZERO,
            unrealized_pl: Decimal::ZERO,
        };
        let mut as_of: Option<NaiveDate> = None;

        for (portfolio, position) in holdings {
            let scheme_name = self
                .scheme_service
                .get_scheme(portfolio.scheme_code)
                .ok()
                .map(|scheme| scheme.scheme_name);

            // A missing NAV degrades this one position, never the whole
            // valuation.
            let (current_nav, nav_as_of, nav_missing) =
                match self.nav_service.get_latest(portfolio.scheme_code).await {
                    Ok(latest) => (latest.nav, Some(latest.as_of), false),
                    Err(err) => {
                        debug!(
                            "No NAV for scheme {} during valuation: {}",
                            portfolio.scheme_code, err
                        );
                        (position.avg_nav, None, true)
                    }
                };

            let current_value = position.total_units * current_nav;
            let unrealized_pl = current_value - position.invested_value;

            totals.invested_value += position.invested_value;
            totals.current_value += current_value;
            totals.unrealized_pl += unrealized_pl;
            if let Some(date) = nav_as_of {
                as_of = Some(as_of.map_or(date, |current| current.max(date)));
            }

            positions.push(PositionValuation {
                scheme_code: portfolio.scheme_code,
                scheme_name,
                units: position.total_units,
                avg_nav: position.avg_nav,
                current_nav,
                invested_value: position.invested_value,
                current_value,
                unrealized_pl,
                nav_missing,
                nav_as_of,
            });
        }

        Ok(PortfolioValuation {
            positions,
            totals,
            as_of: as_of.unwrap_or_else(|| Utc::now().date_naive()),
        })
    }

    fn portfolio_history(&self, user_id: &str, range: HistoryRange) -> Result<Vec<HistoryPoint>> {
        let (start, end) = Self::resolve_range(range)?;

        // Every portfolio the user ever opened can contribute: one that is
        // flat today may have held units inside the window.
        let portfolios = self.portfolio_service.portfolios(user_id)?;

        let mut books = Vec::with_capacity(portfolios.len());
        for portfolio in portfolios {
            let log = self.transactions.list_for_portfolio(&portfolio.id)?;
            if log.is_empty() {
                continue;
            }
            let mut history = self
                .nav_service
                .get_history(portfolio.scheme_code, usize::from(u16::MAX))?;
            history.sort_by_key(|entry| entry.date);
            books.push((portfolio, log, history));
        }

        let mut points = Vec::new();
        let mut date = start;
        while date <= end {
            let mut total_value = Decimal::ZERO;
            let mut total_invested = Decimal::ZERO;

            for (portfolio, log, history) in &books {
                if portfolio.opened_at.date() > date {
                    continue;
                }
                let aggregate = lots::replay_through(log, date);
                if aggregate.is_empty() {
                    continue;
                }
                let nav = nav_at(history, date).unwrap_or(aggregate.avg_nav);
                total_value += aggregate.total_units * nav;
                total_invested += aggregate.invested_value;
            }

            points.push(HistoryPoint {
                date,
                total_value,
                unrealized_pl: total_value - total_invested,
            });
            date += Duration::days(1);
        }

        Ok(points)
    }
}
