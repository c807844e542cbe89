use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::constants::{is_units_significant, is_valid_scheme_code, UNIT_EPSILON};
use crate::nav::NavServiceTrait;
use crate::portfolios::locks::PortfolioLocks;
use crate::portfolios::lots::{self, PositionAggregate};
use crate::portfolios::portfolios_errors::{PortfolioError, Result};
use crate::portfolios::portfolios_model::{
    BuyOutcome, Portfolio, Position, PositionWrite, SellOutcome,
};
use crate::portfolios::portfolios_traits::{PortfolioRepositoryTrait, PortfolioServiceTrait};
use crate::transactions::{
    NewTransaction, Transaction, TransactionRepositoryTrait, TransactionType,
};

/// The transactional portfolio engine. Every mutation serializes on the
/// per-portfolio lock, derives its numbers from the ordered log, and
/// commits the log append together with the position write.
pub struct PortfolioService {
    repository: Arc<dyn PortfolioRepositoryTrait>,
    transactions: Arc<dyn TransactionRepositoryTrait>,
    nav_service: Arc<dyn NavServiceTrait>,
    locks: PortfolioLocks,
}

impl PortfolioService {
    pub fn new(
        repository: Arc<dyn PortfolioRepositoryTrait>,
        transactions: Arc<dyn TransactionRepositoryTrait>,
        nav_service: Arc<dyn NavServiceTrait>,
    ) -> Self {
        Self {
            repository,
            transactions,
            nav_service,
            locks: PortfolioLocks::new(),
        }
    }

    fn validate_order(scheme_code: i32, units: Decimal) -> Result<()> {
        if !is_valid_scheme_code(scheme_code) {
            return Err(PortfolioError::InvalidInput(format!(
                "scheme code {} out of range",
                scheme_code
            )));
        }
        if units <= Decimal::ZERO {
            return Err(PortfolioError::InvalidInput(format!(
                "units must be positive, got {}",
                units
            )));
        }
        Ok(())
    }

    /// Replay the log and bring the cached aggregate back in line with it
    /// if the two disagree beyond the unit tolerance. The replay result is
    /// authoritative for the caller.
    fn reconcile(
        &self,
        portfolio: &Portfolio,
        log: &[Transaction],
    ) -> Result<PositionAggregate> {
        let replayed = lots::replay(log);
        let cached = self.repository.get_position(&portfolio.id)?;

        match cached {
            Some(_) if replayed.is_empty() => {
                warn!(
                    "Position cache for portfolio {} should be empty per replay; removing",
                    portfolio.id
                );
                self.repository.write_position(PositionWrite::Delete {
                    portfolio_id: portfolio.id.clone(),
                })?;
            }
            Some(position) => {
                if position.aggregate().differs_from(&replayed) {
                    warn!(
                        "Position cache for portfolio {} diverged from replay; rebuilding",
                        portfolio.id
                    );
                    self.repository
                        .write_position(PositionWrite::Upsert(Position::from_aggregate(
                            &portfolio.id,
                            portfolio.scheme_code,
                            &replayed,
                            Utc::now().naive_utc(),
                        )))?;
                }
            }
            None if !replayed.is_empty() => {
                warn!(
                    "Position cache missing for portfolio {}; rebuilding from log",
                    portfolio.id
                );
                self.repository
                    .write_position(PositionWrite::Upsert(Position::from_aggregate(
                        &portfolio.id,
                        portfolio.scheme_code,
                        &replayed,
                        Utc::now().naive_utc(),
                    )))?;
            }
            None => {}
        }

        Ok(replayed)
    }
}

#[async_trait]
impl PortfolioServiceTrait for PortfolioService {
    async fn buy(&self, user_id: &str, scheme_code: i32, units: Decimal) -> Result<BuyOutcome> {
        Self::validate_order(scheme_code, units)?;

        let _guard = self.locks.acquire(user_id, scheme_code).await;

        // NAV resolution happens before any write: an unavailable NAV
        // leaves no trace of the order.
        let latest = self.nav_service.get_latest(scheme_code).await?;
        let now = Utc::now().naive_utc();

        let portfolio = self
            .repository
            .get_or_create(user_id, scheme_code, now, latest.nav)?;

        let log = self.transactions.list_for_portfolio(&portfolio.id)?;
        let current = self.reconcile(&portfolio, &log)?;

        let amount = units * latest.nav;
        let total_units = current.total_units + units;
        let invested_value = current.invested_value + amount;
        let aggregate = PositionAggregate {
            total_units,
            invested_value,
            avg_nav: invested_value / total_units,
        };

        let position = Position::from_aggregate(&portfolio.id, scheme_code, &aggregate, now);
        let transaction = self.repository.commit_mutation(
            &NewTransaction {
                portfolio_id: portfolio.id.clone(),
                tx_type: TransactionType::Buy,
                units,
                nav: latest.nav,
                amount,
                realized_pl: None,
                executed_at: now,
            },
            PositionWrite::Upsert(position.clone()),
        )?;

        debug!(
            "BUY {} units of scheme {} for user {} at {}",
            units, scheme_code, user_id, latest.nav
        );

        Ok(BuyOutcome {
            portfolio_id: portfolio.id,
            scheme_code,
            transaction,
            position,
        })
    }

    async fn sell(&self, user_id: &str, scheme_code: i32, units: Decimal) -> Result<SellOutcome> {
        Self::validate_order(scheme_code, units)?;

        let _guard = self.locks.acquire(user_id, scheme_code).await;

        let portfolio = self
            .repository
            .get_by_user_scheme(user_id, scheme_code)?
            .ok_or(PortfolioError::NoPosition(scheme_code))?;

        let log = self.transactions.list_for_portfolio(&portfolio.id)?;
        let current = self.reconcile(&portfolio, &log)?;

        if current.total_units + UNIT_EPSILON < units {
            return Err(PortfolioError::InsufficientUnits {
                requested: units,
                held: current.total_units,
            });
        }

        let latest = self.nav_service.get_latest(scheme_code).await?;
        let now = Utc::now().naive_utc();

        let mut open = lots::open_lots(&log);
        let realized_pl = lots::consume_units(&mut open, units, latest.nav)?;

        let remaining = current.total_units - units;
        let (position, write, remaining_units) = if is_units_significant(&remaining) {
            // avg_nav survives the SELL; invested rescales to the
            // remaining units.
            let aggregate = PositionAggregate {
                total_units: remaining,
                invested_value: remaining * current.avg_nav,
                avg_nav: current.avg_nav,
            };
            let position = Position::from_aggregate(&portfolio.id, scheme_code, &aggregate, now);
            (Some(position.clone()), PositionWrite::Upsert(position), remaining)
        } else {
            (
                None,
                PositionWrite::Delete {
                    portfolio_id: portfolio.id.clone(),
                },
                Decimal::ZERO,
            )
        };

        let transaction = self.repository.commit_mutation(
            &NewTransaction {
                portfolio_id: portfolio.id.clone(),
                tx_type: TransactionType::Sell,
                units,
                nav: latest.nav,
                amount: units * latest.nav,
                realized_pl: Some(realized_pl),
                executed_at: now,
            },
            write,
        )?;

        debug!(
            "SELL {} units of scheme {} for user {}: realized {}",
            units, scheme_code, user_id, realized_pl
        );

        Ok(SellOutcome {
            portfolio_id: portfolio.id,
            scheme_code,
            realized_pl,
            remaining_units,
            transaction,
            position,
        })
    }

    async fn remove(&self, user_id: &str, scheme_code: i32) -> Result<()> {
        let _guard = self.locks.acquire(user_id, scheme_code).await;

        let portfolio = self
            .repository
            .get_by_user_scheme(user_id, scheme_code)?
            .ok_or(PortfolioError::NoPosition(scheme_code))?;

        if let Some(position) = self.repository.get_position(&portfolio.id)? {
            if is_units_significant(&position.total_units) {
                return Err(PortfolioError::HasTransactions(scheme_code));
            }
        }
        if self.transactions.count_for_portfolio(&portfolio.id)? > 0 {
            return Err(PortfolioError::HasTransactions(scheme_code));
        }

        self.repository.delete_portfolio(&portfolio.id)
    }

    fn holdings(&self, user_id: &str) -> Result<Vec<(Portfolio, Position)>> {
        let mut holdings = Vec::new();

        for (portfolio, _cached) in self.repository.list_holdings(user_id)? {
            let log = self.transactions.list_for_portfolio(&portfolio.id)?;
            if log.is_empty() {
                continue;
            }
            let aggregate = self.reconcile(&portfolio, &log)?;
            if aggregate.is_empty() {
                continue;
            }
            let position = Position::from_aggregate(
                &portfolio.id,
                portfolio.scheme_code,
                &aggregate,
                Utc::now().naive_utc(),
            );
            holdings.push((portfolio, position));
        }

        Ok(holdings)
    }

    fn portfolios(&self, user_id: &str) -> Result<Vec<Portfolio>> {
        self.repository.list_portfolios(user_id)
    }
}
