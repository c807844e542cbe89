use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog entry for a mutual fund scheme. Read-mostly metadata; never on
/// the write path of a portfolio mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scheme {
    pub scheme_code: i32,
    pub scheme_name: String,
    pub fund_house: String,
    pub scheme_type: String,
    pub scheme_category: String,
}

#[derive(
    Queryable, Identifiable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::schemes)]
#[diesel(primary_key(scheme_code))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SchemeDb {
    pub scheme_code: i32,
    pub scheme_name: String,
    pub fund_house: String,
    pub scheme_type: String,
    pub scheme_category: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<SchemeDb> for Scheme {
    fn from(db: SchemeDb) -> Self {
        Scheme {
            scheme_code: db.scheme_code,
            scheme_name: db.scheme_name,
            fund_house: db.fund_house,
            scheme_type: db.scheme_type,
            scheme_category: db.scheme_category,
        }
    }
}

/// Upsert payload built from the provider's `meta` block.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScheme {
    pub scheme_code: i32,
    pub scheme_name: String,
    pub fund_house: String,
    pub scheme_type: String,
    pub scheme_category: String,
}
