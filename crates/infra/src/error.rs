use thiserror::Error;

use pharmstock_core::DomainError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by the application services.
///
/// `Domain` covers every expected, user-facing outcome. `Store` is an
/// infrastructure failure passed through unchanged; callers own retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => ServiceError::Domain(DomainError::Conflict(msg)),
            StoreError::NotFound(msg) => ServiceError::Domain(DomainError::NotFound(msg)),
            other @ StoreError::Backend(_) => ServiceError::Store(other),
        }
    }
}
