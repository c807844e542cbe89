use crate::transactions::transactions_errors::Result;
use crate::transactions::transactions_model::{Transaction, TransactionFilter, TransactionPage};

pub trait TransactionRepositoryTrait: Send + Sync {
    /// Per-portfolio log in `(executed_at, id)` ascending order.
    fn list_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<Transaction>>;

    fn count_for_portfolio(&self, portfolio_id: &str) -> Result<i64>;

    /// Paginated view over all of a user's portfolios, newest first.
    fn search(&self, user_id: &str, filter: &TransactionFilter) -> Result<TransactionPage>;
}
