use chrono::NaiveDateTime;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{TX_TYPE_BUY, TX_TYPE_SELL};
use crate::utils::decimal_serde::{amount_serde, amount_serde_option, nav_serde, units_serde};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => TX_TYPE_BUY,
            TransactionType::Sell => TX_TYPE_SELL,
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            TX_TYPE_BUY => Ok(TransactionType::Buy),
            TX_TYPE_SELL => Ok(TransactionType::Sell),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// One entry of the append-only log. Never mutated, never deleted; per
/// portfolio the order `(executed_at, id)` is what FIFO consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub portfolio_id: String,
    pub tx_type: TransactionType,
    #[serde(with = "units_serde")]
    pub units: Decimal,
    #[serde(with = "nav_serde")]
    pub nav: Decimal,
    #[serde(with = "amount_serde")]
    pub amount: Decimal,
    #[serde(with = "amount_serde_option")]
    pub realized_pl: Option<Decimal>,
    pub executed_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDb {
    pub id: i64,
    pub portfolio_id: String,
    pub tx_type: String,
    pub units: String,
    pub nav: String,
    pub amount: String,
    pub realized_pl: Option<String>,
    pub executed_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl From<TransactionDb> for Transaction {
    fn from(db: TransactionDb) -> Self {
        Transaction {
            id: db.id,
            portfolio_id: db.portfolio_id,
            tx_type: TransactionType::from_str(&db.tx_type).unwrap_or(TransactionType::Buy),
            units: Decimal::from_str(&db.units).unwrap_or_default(),
            nav: Decimal::from_str(&db.nav).unwrap_or_default(),
            amount: Decimal::from_str(&db.amount).unwrap_or_default(),
            realized_pl: db
                .realized_pl
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok()),
            executed_at: db.executed_at,
            created_at: db.created_at,
        }
    }
}

/// Append payload; the log assigns the id.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub portfolio_id: String,
    pub tx_type: TransactionType,
    pub units: Decimal,
    pub nav: Decimal,
    pub amount: Decimal,
    pub realized_pl: Option<Decimal>,
    pub executed_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::transactions)]
pub struct NewTransactionDb {
    pub portfolio_id: String,
    pub tx_type: String,
    pub units: String,
    pub nav: String,
    pub amount: String,
    pub realized_pl: Option<String>,
    pub executed_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

impl From<&NewTransaction> for NewTransactionDb {
    fn from(tx: &NewTransaction) -> Self {
        NewTransactionDb {
            portfolio_id: tx.portfolio_id.clone(),
            tx_type: tx.tx_type.as_str().to_string(),
            units: tx.units.to_string(),
            nav: tx.nav.to_string(),
            amount: tx.amount.to_string(),
            realized_pl: tx.realized_pl.map(|d| d.to_string()),
            executed_at: tx.executed_at,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Filters for the paginated log endpoint. Pages are 1-based.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub scheme_code: Option<i32>,
    pub tx_type: Option<TransactionType>,
    pub page: i64,
    pub limit: i64,
}

/// One page of a user's log, adorned with the scheme each entry belongs to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub items: Vec<TransactionWithScheme>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionWithScheme {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub scheme_code: i32,
}
