pub mod locks;
pub mod lots;
pub mod portfolios_errors;
pub mod portfolios_model;
pub mod portfolios_repository;
pub mod portfolios_service;
pub mod portfolios_traits;

pub use locks::PortfolioLocks;
pub use lots::{Lot, PositionAggregate};
pub use portfolios_errors::PortfolioError;
pub use portfolios_model::{BuyOutcome, Portfolio, Position, PositionWrite, SellOutcome};
pub use portfolios_repository::PortfolioRepository;
pub use portfolios_service::PortfolioService;
pub use portfolios_traits::{PortfolioRepositoryTrait, PortfolioServiceTrait};

#[cfg(test)]
pub(crate) mod tests;
