//! Remote REST service seam
//!
//! The gateway talks to the backend through [`RemoteService`]. Payloads stay
//! as JSON at this boundary; the gateway owns typing them.

mod http;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{EntityId, EntityKind, ListQuery};

pub use http::{HttpRemote, HttpRemoteConfig};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote rejected request: {message} ({status})")]
    Status { status: u16, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
    #[error("Remote unreachable: {0}")]
    Unreachable(String),
}

impl RemoteError {
    /// Whether the request never got an answer (no network, timeout, DNS)
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Http(error) => {
                error.is_connect() || error.is_timeout() || error.is_request()
            }
            Self::Unreachable(_) => true,
            Self::InvalidConfiguration(_) | Self::Status { .. } | Self::InvalidPayload(_) => {
                false
            }
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// CRUD endpoints of the backend, per entity collection
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// `GET /<collection>`
    async fn list(&self, kind: EntityKind, query: &ListQuery) -> RemoteResult<Vec<Value>>;

    /// `POST /<collection>`; returns the created entity with its server id
    async fn create(&self, kind: EntityKind, payload: Value) -> RemoteResult<Value>;

    /// `PUT /<collection>/<id>`; returns the updated entity
    async fn update(&self, kind: EntityKind, id: &EntityId, changes: Value)
        -> RemoteResult<Value>;

    /// `DELETE /<collection>/<id>`
    async fn delete(&self, kind: EntityKind, id: &EntityId) -> RemoteResult<()>;

    /// `GET /health`
    async fn health(&self) -> RemoteResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_are_not_connectivity() {
        let error = RemoteError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!error.is_connectivity());
        assert_eq!(error.to_string(), "Remote rejected request: boom (500)");
        assert!(RemoteError::Unreachable("offline".to_string()).is_connectivity());
    }
}
