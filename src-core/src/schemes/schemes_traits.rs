use crate::schemes::schemes_errors::Result;
use crate::schemes::schemes_model::{NewScheme, Scheme};

pub trait SchemeRepositoryTrait: Send + Sync {
    fn get_by_code(&self, code: i32) -> Result<Scheme>;
    fn search(&self, keyword: &str, limit: i64) -> Result<Vec<Scheme>>;
    fn upsert(&self, scheme: &NewScheme) -> Result<Scheme>;
}

pub trait SchemeServiceTrait: Send + Sync {
    fn get_scheme(&self, code: i32) -> Result<Scheme>;
    fn search_schemes(&self, keyword: &str) -> Result<Vec<Scheme>>;
    fn record_scheme(&self, scheme: NewScheme) -> Result<Scheme>;
}
