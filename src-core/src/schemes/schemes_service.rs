use log::debug;
use std::sync::Arc;

use crate::constants::is_valid_scheme_code;
use crate::schemes::schemes_errors::{Result, SchemeError};
use crate::schemes::schemes_model::{NewScheme, Scheme};
use crate::schemes::schemes_traits::{SchemeRepositoryTrait, SchemeServiceTrait};

const SEARCH_RESULT_LIMIT: i64 = 50;

pub struct SchemeService {
    repository: Arc<dyn SchemeRepositoryTrait>,
}

impl SchemeService {
    pub fn new(repository: Arc<dyn SchemeRepositoryTrait>) -> Self {
        Self { repository }
    }
}

impl SchemeServiceTrait for SchemeService {
    fn get_scheme(&self, code: i32) -> Result<Scheme> {
        if !is_valid_scheme_code(code) {
            return Err(SchemeError::InvalidSchemeCode(code));
        }
        self.repository.get_by_code(code)
    }

    fn search_schemes(&self, keyword: &str) -> Result<Vec<Scheme>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        self.repository.search(keyword, SEARCH_RESULT_LIMIT)
    }

    fn record_scheme(&self, scheme: NewScheme) -> Result<Scheme> {
        if !is_valid_scheme_code(scheme.scheme_code) {
            return Err(SchemeError::InvalidSchemeCode(scheme.scheme_code));
        }
        debug!("Recording scheme {} in catalog", scheme.scheme_code);
        self.repository.upsert(&scheme)
    }
}
