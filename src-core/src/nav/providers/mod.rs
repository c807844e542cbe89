pub mod mfapi_provider;
pub mod models;
pub mod quote_provider;

pub use mfapi_provider::MfApiProvider;
pub use models::{FundListing, LatestQuote};
pub use quote_provider::QuoteProviderTrait;
