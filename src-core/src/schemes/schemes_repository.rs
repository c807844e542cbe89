use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::schema::schemes;
use crate::schemes::schemes_errors::{Result, SchemeError};
use crate::schemes::schemes_model::{NewScheme, Scheme, SchemeDb};
use crate::schemes::schemes_traits::SchemeRepositoryTrait;

pub struct SchemeRepository {
    pool: Arc<DbPool>,
}

impl SchemeRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl SchemeRepositoryTrait for SchemeRepository {
    fn get_by_code(&self, code: i32) -> Result<Scheme> {
        let mut conn = get_connection(&self.pool)?;

        schemes::table
            .find(code)
            .first::<SchemeDb>(&mut conn)
            .optional()?
            .map(Scheme::from)
            .ok_or(SchemeError::NotFound(code))
    }

    fn search(&self, keyword: &str, limit: i64) -> Result<Vec<Scheme>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(schemes::table
            .filter(schemes::scheme_name.like(format!("%{}%", keyword)))
            .order(schemes::scheme_name.asc())
            .limit(limit)
            .load::<SchemeDb>(&mut conn)?
            .into_iter()
            .map(Scheme::from)
            .collect())
    }

    fn upsert(&self, scheme: &NewScheme) -> Result<Scheme> {
        let mut conn = get_connection(&self.pool)?;
        let now = Utc::now().naive_utc();

        let row = SchemeDb {
            scheme_code: scheme.scheme_code,
            scheme_name: scheme.scheme_name.clone(),
            fund_house: scheme.fund_house.clone(),
            scheme_type: scheme.scheme_type.clone(),
            scheme_category: scheme.scheme_category.clone(),
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(schemes::table)
            .values(&row)
            .on_conflict(schemes::scheme_code)
            .do_update()
            .set((
                schemes::scheme_name.eq(&row.scheme_name),
                schemes::fund_house.eq(&row.fund_house),
                schemes::scheme_type.eq(&row.scheme_type),
                schemes::scheme_category.eq(&row.scheme_category),
                schemes::updated_at.eq(now),
            ))
            .execute(&mut conn)?;

        Ok(Scheme::from(row))
    }
}
