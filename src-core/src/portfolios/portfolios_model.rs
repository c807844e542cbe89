use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::portfolios::lots::PositionAggregate;
use crate::transactions::Transaction;
use crate::utils::decimal_serde::{amount_serde, nav_serde, units_serde};

/// Logical handle for a (user, scheme) pair; created on first BUY and at
/// most one per pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub user_id: String,
    pub scheme_code: i32,
    pub opened_at: NaiveDateTime,
    #[serde(with = "nav_serde")]
    pub opening_nav: Decimal,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::portfolios)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioDb {
    pub id: String,
    pub user_id: String,
    pub scheme_code: i32,
    pub opened_at: NaiveDateTime,
    pub opening_nav: String,
    pub created_at: NaiveDateTime,
}

impl From<PortfolioDb> for Portfolio {
    fn from(db: PortfolioDb) -> Self {
        Portfolio {
            id: db.id,
            user_id: db.user_id,
            scheme_code: db.scheme_code,
            opened_at: db.opened_at,
            opening_nav: Decimal::from_str(&db.opening_nav).unwrap_or_default(),
            created_at: db.created_at,
        }
    }
}

/// Cached aggregate over a portfolio's log. Removed when a SELL takes the
/// units to zero; the Portfolio row and the log remain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub portfolio_id: String,
    pub scheme_code: i32,
    #[serde(with = "units_serde")]
    pub total_units: Decimal,
    #[serde(with = "amount_serde")]
    pub invested_value: Decimal,
    #[serde(with = "nav_serde")]
    pub avg_nav: Decimal,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::positions)]
#[diesel(primary_key(portfolio_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PositionDb {
    pub portfolio_id: String,
    pub scheme_code: i32,
    pub total_units: String,
    pub invested_value: String,
    pub avg_nav: String,
    pub updated_at: NaiveDateTime,
}

impl From<PositionDb> for Position {
    fn from(db: PositionDb) -> Self {
        Position {
            portfolio_id: db.portfolio_id,
            scheme_code: db.scheme_code,
            total_units: Decimal::from_str(&db.total_units).unwrap_or_default(),
            invested_value: Decimal::from_str(&db.invested_value).unwrap_or_default(),
            avg_nav: Decimal::from_str(&db.avg_nav).unwrap_or_default(),
            updated_at: db.updated_at,
        }
    }
}

impl From<&Position> for PositionDb {
    fn from(position: &Position) -> Self {
        PositionDb {
            portfolio_id: position.portfolio_id.clone(),
            scheme_code: position.scheme_code,
            total_units: position.total_units.to_string(),
            invested_value: position.invested_value.to_string(),
            avg_nav: position.avg_nav.to_string(),
            updated_at: position.updated_at,
        }
    }
}

impl Position {
    pub fn from_aggregate(
        portfolio_id: &str,
        scheme_code: i32,
        aggregate: &PositionAggregate,
        updated_at: NaiveDateTime,
    ) -> Self {
        Position {
            portfolio_id: portfolio_id.to_string(),
            scheme_code,
            total_units: aggregate.total_units,
            invested_value: aggregate.invested_value,
            avg_nav: aggregate.avg_nav,
            updated_at,
        }
    }

    pub fn aggregate(&self) -> PositionAggregate {
        PositionAggregate {
            total_units: self.total_units,
            invested_value: self.invested_value,
            avg_nav: self.avg_nav,
        }
    }
}

/// What a committed BUY looks like to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyOutcome {
    pub portfolio_id: String,
    pub scheme_code: i32,
    pub transaction: Transaction,
    pub position: Position,
}

/// What a committed SELL looks like to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellOutcome {
    pub portfolio_id: String,
    pub scheme_code: i32,
    #[serde(with = "amount_serde")]
    pub realized_pl: Decimal,
    #[serde(with = "units_serde")]
    pub remaining_units: Decimal,
    pub transaction: Transaction,
    pub position: Option<Position>,
}

/// Position write committed atomically with a log append.
#[derive(Debug, Clone)]
pub enum PositionWrite {
    Upsert(Position),
    Delete { portfolio_id: String },
}
