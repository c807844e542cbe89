use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::schema::{portfolios, transactions};
use crate::transactions::transactions_errors::{Result, TransactionError};
use crate::transactions::transactions_model::{
    NewTransaction, NewTransactionDb, Transaction, TransactionDb, TransactionFilter,
    TransactionPage, TransactionWithScheme,
};
use crate::transactions::transactions_traits::TransactionRepositoryTrait;

/// Append one log entry on an open connection. Runs inside the caller's
/// enclosing diesel transaction so the append commits atomically with the
/// position update.
pub(crate) fn append_on(conn: &mut SqliteConnection, tx: &NewTransaction) -> QueryResult<Transaction> {
    let row = NewTransactionDb::from(tx);
    let inserted: TransactionDb = diesel::insert_into(transactions::table)
        .values(&row)
        .get_result(conn)?;
    Ok(Transaction::from(inserted))
}

/// Full per-portfolio log in FIFO order: `(executed_at, id)` ascending.
pub(crate) fn load_ordered_on(
    conn: &mut SqliteConnection,
    portfolio_id: &str,
) -> QueryResult<Vec<Transaction>> {
    Ok(transactions::table
        .filter(transactions::portfolio_id.eq(portfolio_id))
        .order((transactions::executed_at.asc(), transactions::id.asc()))
        .load::<TransactionDb>(conn)?
        .into_iter()
        .map(Transaction::from)
        .collect())
}

pub(crate) fn count_on(conn: &mut SqliteConnection, portfolio_id: &str) -> QueryResult<i64> {
    transactions::table
        .filter(transactions::portfolio_id.eq(portfolio_id))
        .count()
        .get_result(conn)
}

pub struct TransactionRepository {
    pool: Arc<DbPool>,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl TransactionRepositoryTrait for TransactionRepository {
    fn list_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(load_ordered_on(&mut conn, portfolio_id)?)
    }

    fn count_for_portfolio(&self, portfolio_id: &str) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        Ok(count_on(&mut conn, portfolio_id)?)
    }

    fn search(&self, user_id: &str, filter: &TransactionFilter) -> Result<TransactionPage> {
        if filter.page < 1 {
            return Err(TransactionError::InvalidPagination(format!(
                "page must be >= 1, got {}",
                filter.page
            )));
        }
        if filter.limit < 1 {
            return Err(TransactionError::InvalidPagination(format!(
                "limit must be >= 1, got {}",
                filter.limit
            )));
        }

        let mut conn = get_connection(&self.pool)?;
        let offset = (filter.page - 1) * filter.limit;

        let base = || {
            let mut query = transactions::table
                .inner_join(portfolios::table.on(transactions::portfolio_id.eq(portfolios::id)))
                .filter(portfolios::user_id.eq(user_id.to_string()))
                .into_boxed();

            if let Some(code) = filter.scheme_code {
                query = query.filter(portfolios::scheme_code.eq(code));
            }
            if let Some(tx_type) = filter.tx_type {
                query = query.filter(transactions::tx_type.eq(tx_type.as_str()));
            }
            query
        };

        let total = base().count().get_result::<i64>(&mut conn)?;

        let rows = base()
            .select((TransactionDb::as_select(), portfolios::scheme_code))
            .order((transactions::executed_at.desc(), transactions::id.desc()))
            .limit(filter.limit)
            .offset(offset)
            .load::<(TransactionDb, i32)>(&mut conn)?;

        Ok(TransactionPage {
            items: rows
                .into_iter()
                .map(|(tx, scheme_code)| TransactionWithScheme {
                    transaction: Transaction::from(tx),
                    scheme_code,
                })
                .collect(),
            total,
            page: filter.page,
            limit: filter.limit,
        })
    }
}
