use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubscriptionRepositoryError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("DynamoDB error: {0}")]
    DynamoDb(String),
    #[error("API Gateway error: {0}")]
    ApiGateway(String),
    #[error("Connection {0} is gone")]
    ConnectionGone(String),
}
