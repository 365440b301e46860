use axum::{middleware::from_fn, middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware;
use super::state::AppState;
use super::v1;

/// Create the full router with the credential gateway wrapped around every
/// route. Public paths are exempted inside the gateway itself so probes work
/// regardless of auth mode.
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::service_info))
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::credential_gateway,
        ))
        .layer(from_fn(middleware::logging_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    use crate::domain::{
        ClientIdentity, CredentialId, CredentialRecord, CredentialStore, DomainError, RateCeilings,
        SearchBackend, SearchHit, SearchRequest, SearchResponse,
    };
    use crate::infrastructure::credential::{
        token, AuthMode, DatabaseAuthConfig, DatabaseAuthenticator, InMemoryCredentialStore,
        StaticAuthenticator,
    };

    /// Echoes the attributed client name back so tests can observe it
    #[derive(Debug, Default)]
    struct StubSearchBackend;

    #[async_trait]
    impl SearchBackend for StubSearchBackend {
        async fn search(
            &self,
            request: SearchRequest,
            client: &ClientIdentity,
        ) -> Result<SearchResponse, DomainError> {
            Ok(SearchResponse {
                results: vec![SearchHit {
                    document_id: "doc-1".to_string(),
                    title: client.client_name.clone(),
                    snippet: request.query,
                    score: 1.0,
                }],
            })
        }
    }

    fn router_with_mode(auth: AuthMode) -> Router {
        let state = AppState::new(auth, Arc::new(StubSearchBackend));
        create_router_with_state(state)
    }

    fn static_router() -> Router {
        let mut names = HashMap::new();
        names.insert("static-key-1".to_string(), "Client A".to_string());
        let authenticator =
            StaticAuthenticator::from_config(vec!["static-key-1".to_string()], names).unwrap();
        router_with_mode(AuthMode::Static(authenticator))
    }

    async fn database_router(
        record: CredentialRecord,
    ) -> (Router, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.insert_credential(record).await;
        let dyn_store: Arc<dyn CredentialStore> = store.clone();
        let authenticator =
            DatabaseAuthenticator::new(dyn_store, DatabaseAuthConfig::default());
        (
            router_with_mode(AuthMode::Database(Arc::new(authenticator))),
            store,
        )
    }

    fn seeded_record(token_plain: &str) -> CredentialRecord {
        CredentialRecord::new(
            CredentialId::new("cred-1"),
            "Client A",
            token::hash_token(token_plain),
            token::token_prefix(token_plain),
        )
    }

    fn search_request(auth_header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/v1/search")
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(value) = auth_header {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        builder
            .body(Body::from(r#"{"query": "lease termination"}"#))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_bypasses_authentication() {
        let (router, _store) = database_router(seeded_record("tok")).await;

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_root_info_is_public() {
        let router = static_router();

        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["auth_mode"], "static");
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected() {
        let router = static_router();

        let response = router.oneshot(search_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], true);
        assert_eq!(json["error_type"], "authentication_error");
        assert_eq!(json["details"]["required_header"], "Authorization");
    }

    #[tokio::test]
    async fn test_wrong_scheme_rejected_with_diagnostics() {
        let router = static_router();

        let response = router
            .oneshot(search_request(Some("Basic dXNlcjpwYXNz")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error_type"], "authentication_error");
        assert_eq!(json["details"]["received_format"], "Basic");
    }

    #[tokio::test]
    async fn test_static_mode_accepts_configured_key() {
        let router = static_router();

        let response = router
            .oneshot(search_request(Some("Bearer static-key-1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        // the stub echoes the attributed client name
        assert_eq!(json["results"][0]["title"], "Client A");
    }

    #[tokio::test]
    async fn test_static_mode_rejects_unknown_key() {
        let router = static_router();

        let response = router
            .oneshot(search_request(Some("Bearer wrong-key")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error_type"], "authentication_error");
    }

    #[tokio::test]
    async fn test_disabled_mode_passes_everything() {
        let router = router_with_mode(AuthMode::Disabled);

        let response = router.oneshot(search_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["results"][0]["title"], "Unknown");
    }

    #[tokio::test]
    async fn test_database_mode_accepts_and_logs_usage() {
        let token_plain = "db-token-1";
        let (router, store) = database_router(seeded_record(token_plain)).await;

        let response = router
            .oneshot(search_request(Some(&format!("Bearer {}", token_plain))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["results"][0]["title"], "Client A");

        // the usage log row is written by a spawned task
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let entries = store.usage_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].credential_id, "cred-1");
        assert_eq!(entries[0].status_code, 200);
        assert_eq!(entries[0].endpoint, "/v1/search");
        assert!(entries[0].latency_ms.is_some());
    }

    #[tokio::test]
    async fn test_database_mode_rejects_unknown_token() {
        let (router, store) = database_router(seeded_record("db-token-1")).await;

        let response = router
            .oneshot(search_request(Some("Bearer no-such-token")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let entries = store.usage_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].credential_id, "unknown");
        assert_eq!(entries[0].status_code, 401);
    }

    #[tokio::test]
    async fn test_database_mode_rate_limits_with_retry_guidance() {
        let token_plain = "db-token-1";
        let record = seeded_record(token_plain).with_rate_ceilings(RateCeilings::new(1, 0, 0));
        let (router, store) = database_router(record).await;

        let first = router
            .clone()
            .oneshot(search_request(Some(&format!("Bearer {}", token_plain))))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = router
            .oneshot(search_request(Some(&format!("Bearer {}", token_plain))))
            .await
            .unwrap();

        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers().get(header::RETRY_AFTER).unwrap(), "60");
        assert!(second.headers().contains_key("x-ratelimit-reset"));

        let json = body_json(second).await;
        assert_eq!(json["error_type"], "rate_limit_exceeded");
        assert_eq!(json["retry_after"], 60);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let statuses: Vec<u16> = store
            .usage_entries()
            .await
            .iter()
            .map(|e| e.status_code)
            .collect();
        assert!(statuses.contains(&200));
        assert!(statuses.contains(&429));
    }

    #[tokio::test]
    async fn test_database_mode_rejects_expired_credential() {
        let token_plain = "db-token-1";
        let record =
            seeded_record(token_plain).with_expiration(Utc::now() - Duration::minutes(5));
        let (router, _store) = database_router(record).await;

        let response = router
            .oneshot(search_request(Some(&format!("Bearer {}", token_plain))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
