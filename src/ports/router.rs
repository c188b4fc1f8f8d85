use async_trait::async_trait;
use thiserror::Error;

use crate::domain::OrderRequest;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Order rejected: {0}")]
    Rejected(String),
    #[error("Router unavailable: {0}")]
    Unavailable(String),
}

/// Hands orders to the venue.
///
/// Outcomes come back asynchronously as lifecycle events, so `Ok` only
/// means the order left this process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRouter: Send + Sync {
    async fn submit(&self, request: &OrderRequest) -> Result<(), RouterError>;
}
