use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::utils::decimal_serde::nav_serde;

/// Most recently observed authoritative NAV for a scheme. One row per
/// scheme; writes are monotone by `as_of` (see repository).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatestNav {
    pub scheme_code: i32,
    #[serde(with = "nav_serde")]
    pub nav: Decimal,
    pub as_of: NaiveDate,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::latest_navs)]
#[diesel(primary_key(scheme_code))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LatestNavDb {
    pub scheme_code: i32,
    pub nav: String,
    pub as_of: NaiveDate,
    pub updated_at: NaiveDateTime,
}

impl From<LatestNavDb> for LatestNav {
    fn from(db: LatestNavDb) -> Self {
        LatestNav {
            scheme_code: db.scheme_code,
            nav: Decimal::from_str(&db.nav).unwrap_or_default(),
            as_of: db.as_of,
            updated_at: db.updated_at,
        }
    }
}

impl From<&LatestNav> for LatestNavDb {
    fn from(nav: &LatestNav) -> Self {
        LatestNavDb {
            scheme_code: nav.scheme_code,
            nav: nav.nav.to_string(),
            as_of: nav.as_of,
            updated_at: nav.updated_at,
        }
    }
}

/// One day in a scheme's bounded NAV series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavHistoryEntry {
    pub date: NaiveDate,
    #[serde(with = "nav_serde")]
    pub nav: Decimal,
}

#[derive(Queryable, Identifiable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::nav_history)]
#[diesel(primary_key(scheme_code, date))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NavHistoryDb {
    pub scheme_code: i32,
    pub date: NaiveDate,
    pub nav: String,
}

impl From<NavHistoryDb> for NavHistoryEntry {
    fn from(db: NavHistoryDb) -> Self {
        NavHistoryEntry {
            date: db.date,
            nav: Decimal::from_str(&db.nav).unwrap_or_default(),
        }
    }
}

/// Outcome of one refresh run over the active scheme set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub total: usize,
    pub successes: Vec<i32>,
    pub failures: Vec<RefreshFailure>,
    pub duration_ms: u64,
    pub started_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshFailure {
    pub scheme_code: i32,
    pub error: String,
}
