use thiserror::Error;

use crate::error::AppError;
use crate::services::grants::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Uniform pairing failure. Covers bad credentials, unknown session,
    /// and expired session alike so callers learn nothing about which
    /// check failed.
    #[error("Unable to authenticate")]
    AuthenticationFailed,

    #[error("Share link not found")]
    ShareNotFound,

    #[error("Video repository unavailable: {0}")]
    RepositoryUnavailable(String),

    #[error("Bucket '{0}' does not exist")]
    BucketNotFound(String),

    #[error("Missing or invalid video name")]
    InvalidName,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BucketNotFound(bucket) => ServiceError::BucketNotFound(bucket),
            StoreError::Unavailable(msg) => ServiceError::RepositoryUnavailable(msg),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Redis(e) => AppError::RedisError(e),
            ServiceError::AuthenticationFailed => {
                AppError::Unauthorized(anyhow::anyhow!("Unable to authenticate"))
            }
            ServiceError::ShareNotFound => AppError::NotFound(anyhow::anyhow!(
                "Unable to process. Please contact whomever shared this link with you and request a new link."
            )),
            ServiceError::RepositoryUnavailable(msg) => {
                AppError::ServiceUnavailable(format!("Error interacting with video repository: {}", msg))
            }
            ServiceError::BucketNotFound(bucket) => {
                AppError::BadGateway(format!("bucket '{}' does not exist", bucket))
            }
            ServiceError::InvalidName => {
                AppError::BadRequest(anyhow::anyhow!("Missing or invalid video name"))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
