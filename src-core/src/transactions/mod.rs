pub mod transactions_errors;
pub mod transactions_model;
pub mod transactions_repository;
pub mod transactions_traits;

pub use transactions_errors::TransactionError;
pub use transactions_model::{
    NewTransaction, Transaction, TransactionFilter, TransactionPage, TransactionType,
    TransactionWithScheme,
};
pub use transactions_repository::TransactionRepository;
pub use transactions_traits::TransactionRepositoryTrait;
