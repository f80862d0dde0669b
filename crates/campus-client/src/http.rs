//! `reqwest`-backed implementation of [`QueryBackend`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use campus_core::config::BackendConfig;
use campus_core::types::{QueryRequest, QueryResponse, ServerConfig};

use crate::backend::QueryBackend;
use crate::error::ClientError;

/// HTTP client for the campus backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_key_field: String,
}

impl HttpBackend {
    /// Build a client from the backend section of the config.
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Config("backend base_url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key_field: config.api_key_field.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fail on non-2xx, otherwise return the body text.
    async fn read_body(response: reqwest::Response) -> Result<String, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }
        response
            .text()
            .await
            .map_err(|e| ClientError::Request(format!("Failed to read response body: {}", e)))
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    async fn fetch_config(&self) -> Result<ServerConfig, ClientError> {
        let url = self.endpoint("/api/config");
        debug!(url = %url, "Fetching backend config");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Request(format!("Failed to send request: {}", e)))?;
        let body = Self::read_body(response).await?;

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ClientError::Malformed(format!("config body: {}", e)))?;
        let config = ServerConfig::from_value(&value, &self.api_key_field)?;
        Ok(config)
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ClientError> {
        let url = self.endpoint("/api/query");
        debug!(url = %url, query_len = request.query.len(), is_3d = request.is_3d, "Sending query");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Request(format!("Failed to send request: {}", e)))?;
        let body = Self::read_body(response).await?;

        let decoded = QueryResponse::from_json(&body).map_err(ClientError::from);
        match &decoded {
            Ok(resp) => debug!(kind = resp.kind(), "Query response decoded"),
            Err(e) => warn!(error = %e, "Query response rejected"),
        }
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = BackendConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..BackendConfig::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.endpoint("/api/query"), "http://localhost:8000/api/query");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let config = BackendConfig {
            base_url: "  ".to_string(),
            ..BackendConfig::default()
        };
        let err = HttpBackend::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
