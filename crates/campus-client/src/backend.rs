//! The backend seam consumed by the chat controller.

use async_trait::async_trait;
use campus_core::types::{QueryRequest, QueryResponse, ServerConfig};

use crate::error::ClientError;

/// The two calls the chat client makes against its backend.
///
/// `HttpBackend` is the production implementation. Tests substitute
/// scripted backends to control latency and replies.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// `GET /api/config`: fetch the map provider key.
    async fn fetch_config(&self) -> Result<ServerConfig, ClientError>;

    /// `POST /api/query`: send one query and decode the typed reply.
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError>;
}
