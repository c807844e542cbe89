use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::nav::nav_errors::NavError;
use crate::nav::nav_model::NavHistoryEntry;
use crate::schemes::NewScheme;

pub const PROVIDER_DATE_FORMAT: &str = "%d-%m-%Y";

/// Raw provider envelope: `{ meta: {...}, data: [{date, nav}, ...] }`,
/// data newest-first, dates as `DD-MM-YYYY`, NAVs as decimal strings.
#[derive(Debug, Deserialize)]
pub struct FundEnvelope {
    pub meta: FundMeta,
    #[serde(default)]
    pub data: Vec<NavRecord>,
}

#[derive(Debug, Deserialize)]
pub struct FundMeta {
    #[serde(default)]
    pub fund_house: String,
    #[serde(default)]
    pub scheme_type: String,
    #[serde(default)]
    pub scheme_category: String,
    #[serde(default)]
    pub scheme_name: String,
    pub scheme_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct NavRecord {
    pub date: String,
    pub nav: String,
}

impl NavRecord {
    pub fn parse(&self) -> Result<NavHistoryEntry, NavError> {
        let date = NaiveDate::parse_from_str(&self.date, PROVIDER_DATE_FORMAT)
            .map_err(|e| NavError::Parse(format!("bad date '{}': {}", self.date, e)))?;
        let nav = self
            .nav
            .parse::<Decimal>()
            .map_err(|e| NavError::Parse(format!("bad nav '{}': {}", self.nav, e)))?;
        if nav <= Decimal::ZERO {
            return Err(NavError::Parse(format!("non-positive nav '{}'", self.nav)));
        }
        Ok(NavHistoryEntry { date, nav })
    }
}

/// One entry of the provider's full fund listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundListing {
    pub scheme_code: i32,
    pub scheme_name: String,
    #[serde(default)]
    pub fund_house: Option<String>,
}

/// Normalized latest-NAV result: value, date and catalog metadata.
#[derive(Debug, Clone)]
pub struct LatestQuote {
    pub scheme_code: i32,
    pub nav: Decimal,
    pub date: NaiveDate,
    pub meta: NewScheme,
}

impl FundMeta {
    pub fn to_new_scheme(&self, scheme_code: i32) -> NewScheme {
        NewScheme {
            scheme_code,
            scheme_name: self.scheme_name.clone(),
            fund_house: self.fund_house.clone(),
            scheme_type: self.scheme_type.clone(),
            scheme_category: self.scheme_category.clone(),
        }
    }
}
