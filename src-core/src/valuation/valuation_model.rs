use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::utils::decimal_serde::{amount_serde, nav_serde, units_serde};

/// One open position joined with the freshest NAV the store could supply.
/// When no NAV is available the position degrades to its own average cost
/// and is flagged, rather than failing the whole valuation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub scheme_code: i32,
    pub scheme_name: Option<String>,
    #[serde(with = "units_serde")]
    pub units: Decimal,
    #[serde(with = "nav_serde")]
    pub avg_nav: Decimal,
    #[serde(with = "nav_serde")]
    pub current_nav: Decimal,
    #[serde(with = "amount_serde")]
    pub invested_value: Decimal,
    #[serde(with = "amount_serde")]
    pub current_value: Decimal,
    #[serde(with = "amount_serde")]
    pub unrealized_pl: Decimal,
    pub nav_missing: bool,
    pub nav_as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationTotals {
    #[serde(with = "amount_serde")]
    pub invested_value: Decimal,
    #[serde(with = "amount_serde")]
    pub current_value: Decimal,
    #[serde(with = "amount_serde")]
    pub unrealized_pl: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub positions: Vec<PositionValuation>,
    pub totals: ValuationTotals,
    pub as_of: NaiveDate,
}

/// One day of the portfolio-value series.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: NaiveDate,
    #[serde(with = "amount_serde")]
    pub total_value: Decimal,
    #[serde(with = "amount_serde")]
    pub unrealized_pl: Decimal,
}

/// Requested window for the value series.
#[derive(Debug, Clone, Copy)]
pub enum HistoryRange {
    /// Last `n` calendar days ending today.
    Days(u32),
    /// Explicit inclusive range.
    Between(NaiveDate, NaiveDate),
}

pub const HISTORY_DEFAULT_DAYS: u32 = 30;
pub const HISTORY_MAX_DAYS: u32 = 365;
