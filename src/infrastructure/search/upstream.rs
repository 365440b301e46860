//! HTTP client for the downstream document-search backend

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{ClientIdentity, DomainError, SearchBackend, SearchRequest, SearchResponse};

/// Header carrying the resolved owner label to the backend for attribution
const CLIENT_NAME_HEADER: &str = "x-client-name";

/// Forwards accepted search requests to the configured backend over HTTP.
/// The gateway never inspects results; only the outcome status matters to it.
#[derive(Debug, Clone)]
pub struct UpstreamSearchService {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamSearchService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SearchBackend for UpstreamSearchService {
    async fn search(
        &self,
        request: SearchRequest,
        client: &ClientIdentity,
    ) -> Result<SearchResponse, DomainError> {
        let url = format!("{}/search", self.base_url);

        debug!(client = %client.client_name, url = %url, "Forwarding search request");

        let response = self
            .client
            .post(&url)
            .header(CLIENT_NAME_HEADER, client.client_name.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::upstream(format!("Search backend unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(DomainError::upstream(format!(
                "Search backend returned status {}",
                response.status()
            )));
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| DomainError::upstream(format!("Invalid search backend response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_forwards_request_with_attribution_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("x-client-name", "Client A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"document_id": "doc-1", "title": "Title", "snippet": "...", "score": 0.9}
                ]
            })))
            .mount(&server)
            .await;

        let service = UpstreamSearchService::new(server.uri());
        let identity = ClientIdentity::new("cred-1".into(), "Client A");

        let response = service
            .search(
                SearchRequest {
                    query: "lease termination".to_string(),
                    top_k: Some(5),
                },
                &identity,
            )
            .await
            .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].document_id, "doc-1");
    }

    #[tokio::test]
    async fn test_backend_error_surfaces_as_upstream_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let service = UpstreamSearchService::new(server.uri());
        let identity = ClientIdentity::anonymous();

        let result = service
            .search(
                SearchRequest {
                    query: "anything".to_string(),
                    top_k: None,
                },
                &identity,
            )
            .await;

        assert!(matches!(result, Err(DomainError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // nothing listens on this port
        let service = UpstreamSearchService::new("http://127.0.0.1:1");
        let identity = ClientIdentity::anonymous();

        let result = service
            .search(
                SearchRequest {
                    query: "anything".to_string(),
                    top_k: None,
                },
                &identity,
            )
            .await;

        assert!(matches!(result, Err(DomainError::Upstream { .. })));
    }
}
