pub mod schemes_errors;
pub mod schemes_model;
pub mod schemes_repository;
pub mod schemes_service;
pub mod schemes_traits;

pub use schemes_errors::SchemeError;
pub use schemes_model::{NewScheme, Scheme};
pub use schemes_repository::SchemeRepository;
pub use schemes_service::SchemeService;
pub use schemes_traits::{SchemeRepositoryTrait, SchemeServiceTrait};
