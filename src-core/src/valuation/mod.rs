pub mod valuation_errors;
pub mod valuation_model;
pub mod valuation_service;
pub mod valuation_traits;

pub use valuation_errors::ValuationError;
pub use valuation_model::{
    HistoryPoint, HistoryRange, PortfolioValuation, PositionValuation, ValuationTotals,
};
pub use valuation_service::ValuationService;
pub use valuation_traits::ValuationServiceTrait;

#[cfg(test)]
pub(crate) mod tests;
