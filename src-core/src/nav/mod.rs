pub mod nav_errors;
pub mod nav_model;
pub mod nav_repository;
pub mod nav_service;
pub mod nav_traits;
pub mod providers;
pub mod refresh;

pub use nav_errors::NavError;
pub use nav_model::{LatestNav, NavHistoryEntry, RefreshFailure, RefreshSummary};
pub use nav_repository::NavRepository;
pub use nav_service::NavService;
pub use nav_traits::{ActiveSchemeSource, NavRepositoryTrait, NavServiceTrait};
pub use providers::{MfApiProvider, QuoteProviderTrait};
pub use refresh::{NavRefreshEngine, RefreshConfig};

#[cfg(test)]
pub(crate) mod tests;
