use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::nav::nav_errors::{NavError, Result};
use crate::nav::nav_model::{LatestNav, LatestNavDb, NavHistoryDb, NavHistoryEntry};
use crate::nav::nav_traits::NavRepositoryTrait;
use crate::schema::{latest_navs, nav_history};

pub struct NavRepository {
    pool: Arc<DbPool>,
}

impl NavRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl NavRepositoryTrait for NavRepository {
    fn get_latest(&self, scheme_code: i32) -> Result<Option<LatestNav>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(latest_navs::table
            .find(scheme_code)
            .first::<LatestNavDb>(&mut conn)
            .optional()?
            .map(LatestNav::from))
    }

    fn upsert_latest(&self, nav: &LatestNav) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let row = LatestNavDb::from(nav);

        conn.transaction::<_, NavError, _>(|conn| {
            let stored = latest_navs::table
                .find(nav.scheme_code)
                .first::<LatestNavDb>(conn)
                .optional()?;

            // Monotone by as_of: an older observation never replaces a newer
            // one; same-day writes take the newer value.
            if let Some(existing) = stored {
                if existing.as_of > row.as_of {
                    return Ok(());
                }
                diesel::update(latest_navs::table.find(nav.scheme_code))
                    .set((
                        latest_navs::nav.eq(&row.nav),
                        latest_navs::as_of.eq(row.as_of),
                        latest_navs::updated_at.eq(row.updated_at),
                    ))
                    .execute(conn)?;
            } else {
                diesel::insert_into(latest_navs::table)
                    .values(&row)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    fn upsert_history_entry(
        &self,
        scheme_code: i32,
        date: NaiveDate,
        nav: Decimal,
        cap: usize,
    ) -> Result<()> {
        let cap = cap.max(1);
        let mut conn = get_connection(&self.pool)?;

        conn.transaction::<_, NavError, _>(|conn| {
            diesel::replace_into(nav_history::table)
                .values(&NavHistoryDb {
                    scheme_code,
                    date,
                    nav: nav.to_string(),
                })
                .execute(conn)?;

            let dates: Vec<NaiveDate> = nav_history::table
                .filter(nav_history::scheme_code.eq(scheme_code))
                .select(nav_history::date)
                .order(nav_history::date.desc())
                .load(conn)?;

            if dates.len() > cap {
                let cutoff = dates[cap - 1];
                diesel::delete(
                    nav_history::table
                        .filter(nav_history::scheme_code.eq(scheme_code))
                        .filter(nav_history::date.lt(cutoff)),
                )
                .execute(conn)?;
            }
            Ok(())
        })
    }

    fn get_history(&self, scheme_code: i32, last_n: usize) -> Result<Vec<NavHistoryEntry>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(nav_history::table
            .filter(nav_history::scheme_code.eq(scheme_code))
            .order(nav_history::date.desc())
            .limit(last_n as i64)
            .load::<NavHistoryDb>(&mut conn)?
            .into_iter()
            .map(NavHistoryEntry::from)
            .collect())
    }

    fn get_nav_on_or_before(
        &self,
        scheme_code: i32,
        date: NaiveDate,
    ) -> Result<Option<NavHistoryEntry>> {
        let mut conn = get_connection(&self.pool)?;

        Ok(nav_history::table
            .filter(nav_history::scheme_code.eq(scheme_code))
            .filter(nav_history::date.le(date))
            .order(nav_history::date.desc())
            .first::<NavHistoryDb>(&mut conn)
            .optional()?
            .map(NavHistoryEntry::from))
    }
}
