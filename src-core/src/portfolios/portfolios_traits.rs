use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::portfolios::portfolios_errors::Result;
use crate::portfolios::portfolios_model::{
    BuyOutcome, Portfolio, Position, PositionWrite, SellOutcome,
};
use crate::transactions::{NewTransaction, Transaction};

pub trait PortfolioRepositoryTrait: Send + Sync {
    fn get_by_user_scheme(&self, user_id: &str, scheme_code: i32) -> Result<Option<Portfolio>>;

    /// Insert-if-absent under the `(user_id, scheme_code)` uniqueness guard;
    /// a racing creator loads the winner's row.
    fn get_or_create(
        &self,
        user_id: &str,
        scheme_code: i32,
        opened_at: NaiveDateTime,
        opening_nav: Decimal,
    ) -> Result<Portfolio>;

    fn get_position(&self, portfolio_id: &str) -> Result<Option<Position>>;

    fn list_holdings(&self, user_id: &str) -> Result<Vec<(Portfolio, Option<Position>)>>;

    fn list_portfolios(&self, user_id: &str) -> Result<Vec<Portfolio>>;

    /// Append one log entry and apply the position write in a single
    /// database transaction.
    fn commit_mutation(
        &self,
        new_tx: &NewTransaction,
        position: PositionWrite,
    ) -> Result<Transaction>;

    /// Rewrite the cached aggregate outside a mutation (reconciliation).
    fn write_position(&self, position: PositionWrite) -> Result<()>;

    fn delete_portfolio(&self, portfolio_id: &str) -> Result<()>;
}

#[async_trait::async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    async fn buy(&self, user_id: &str, scheme_code: i32, units: Decimal) -> Result<BuyOutcome>;

    async fn sell(&self, user_id: &str, scheme_code: i32, units: Decimal) -> Result<SellOutcome>;

    async fn remove(&self, user_id: &str, scheme_code: i32) -> Result<()>;

    /// Open holdings for a user: portfolio plus reconciled position cache.
    fn holdings(&self, user_id: &str) -> Result<Vec<(Portfolio, Position)>>;

    fn portfolios(&self, user_id: &str) -> Result<Vec<Portfolio>>;
}
