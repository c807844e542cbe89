use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{get_connection, DbPool};
use crate::nav;
use crate::portfolios::portfolios_errors::{PortfolioError, Result};
use crate::portfolios::portfolios_model::{
    Portfolio, PortfolioDb, Position, PositionDb, PositionWrite,
};
use crate::portfolios::portfolios_traits::PortfolioRepositoryTrait;
use crate::schema::{portfolios, positions};
use crate::transactions::transactions_repository::append_on;
use crate::transactions::{NewTransaction, Transaction};

pub struct PortfolioRepository {
    pool: Arc<DbPool>,
}

impl PortfolioRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

fn apply_position_write(
    conn: &mut SqliteConnection,
    write: &PositionWrite,
) -> QueryResult<()> {
    match write {
        PositionWrite::Upsert(position) => {
            diesel::replace_into(positions::table)
                .values(&PositionDb::from(position))
                .execute(conn)?;
        }
        PositionWrite::Delete { portfolio_id } => {
            diesel::delete(positions::table.find(portfolio_id)).execute(conn)?;
        }
    }
    Ok(())
}

impl PortfolioRepositoryTrait for PortfolioRepository {
    fn get_by_user_scheme(&self, user_id: &str, scheme_code: i32) -> Result<Option<Portfolio>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(portfolios::table
            .filter(portfolios::user_id.eq(user_id))
            .filter(portfolios::scheme_code.eq(scheme_code))
            .first::<PortfolioDb>(&mut conn)
            .optional()?
            .map(Portfolio::from))
    }

    fn get_or_create(
        &self,
        user_id: &str,
        scheme_code: i32,
        opened_at: NaiveDateTime,
        opening_nav: Decimal,
    ) -> Result<Portfolio> {
        let mut conn = get_connection(&self.pool)?;

        let row = PortfolioDb {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            scheme_code,
            opened_at,
            opening_nav: opening_nav.to_string(),
            created_at: opened_at,
        };

        // The unique (user_id, scheme_code) index arbitrates racing first
        // BUYs; the loser falls through to the winner's row.
        diesel::insert_into(portfolios::table)
            .values(&row)
            .on_conflict_do_nothing()
            .execute(&mut conn)?;

        portfolios::table
            .filter(portfolios::user_id.eq(user_id))
            .filter(portfolios::scheme_code.eq(scheme_code))
            .first::<PortfolioDb>(&mut conn)
            .map(Portfolio::from)
            .map_err(PortfolioError::from)
    }

    fn get_position(&self, portfolio_id: &str) -> Result<Option<Position>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(positions::table
            .find(portfolio_id)
            .first::<PositionDb>(&mut conn)
            .optional()?
            .map(Position::from))
    }

    fn list_holdings(&self, user_id: &str) -> Result<Vec<(Portfolio, Option<Position>)>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(portfolios::table
            .left_join(positions::table)
            .filter(portfolios::user_id.eq(user_id))
            .select((PortfolioDb::as_select(), Option::<PositionDb>::as_select()))
            .order(portfolios::scheme_code.asc())
            .load::<(PortfolioDb, Option<PositionDb>)>(&mut conn)?
            .into_iter()
            .map(|(p, pos)| (Portfolio::from(p), pos.map(Position::from)))
            .collect())
    }

    fn list_portfolios(&self, user_id: &str) -> Result<Vec<Portfolio>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(portfolios::table
            .filter(portfolios::user_id.eq(user_id))
            .order(portfolios::scheme_code.asc())
            .load::<PortfolioDb>(&mut conn)?
            .into_iter()
            .map(Portfolio::from)
            .collect())
    }

    fn commit_mutation(
        &self,
        new_tx: &NewTransaction,
        position: PositionWrite,
    ) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;

        conn.transaction::<_, PortfolioError, _>(|conn| {
            let tx = append_on(conn, new_tx)?;
            apply_position_write(conn, &position)?;
            Ok(tx)
        })
    }

    fn write_position(&self, position: PositionWrite) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        Ok(apply_position_write(&mut conn, &position)?)
    }

    fn delete_portfolio(&self, portfolio_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;

        conn.transaction::<_, PortfolioError, _>(|conn| {
            diesel::delete(positions::table.find(portfolio_id)).execute(conn)?;
            diesel::delete(portfolios::table.find(portfolio_id)).execute(conn)?;
            Ok(())
        })
    }
}

impl nav::ActiveSchemeSource for PortfolioRepository {
    fn active_scheme_codes(&self) -> nav::nav_errors::Result<Vec<i32>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(positions::table
            .select(positions::scheme_code)
            .distinct()
            .order(positions::scheme_code.asc())
            .load::<i32>(&mut conn)?)
    }
}
