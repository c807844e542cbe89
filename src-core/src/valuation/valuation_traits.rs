use async_trait::async_trait;

use crate::valuation::valuation_errors::Result;
use crate::valuation::valuation_model::{HistoryPoint, HistoryRange, PortfolioValuation};

#[async_trait]
pub trait ValuationServiceTrait: Send + Sync {
    /// Current value of every open position for a user, degrading
    /// per-position when a NAV cannot be resolved.
    async fn portfolio_value(&self, user_id: &str) -> Result<PortfolioValuation>;

    /// Portfolio value per calendar day over the window, valuing each
    /// position at the NAV on-or-before that day.
    fn portfolio_history(&self, user_id: &str, range: HistoryRange) -> Result<Vec<HistoryPoint>>;
}
