use thiserror::Error;

use crate::repositories::errors::subscription_repository_errors::SubscriptionRepositoryError;

#[derive(Debug, Error)]
pub enum SubscriptionServiceError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] SubscriptionRepositoryError),
}
