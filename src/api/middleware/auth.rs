//! Credential gateway middleware
//!
//! Intercepts every inbound request, resolves the bearer credential through
//! the configured validation mode and drives rate limiting and usage
//! accounting. Rejections short-circuit before the downstream handler runs;
//! accounting effects are fire-and-forget and never fail the request.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{ClientIdentity, RateWindow, UsageLogEntry, UNKNOWN_CREDENTIAL};
use crate::infrastructure::credential::{AuthMode, DatabaseAuthenticator};

/// Paths served without authentication
pub const PUBLIC_PATHS: &[&str] = &["/", "/health", "/live"];

pub async fn credential_gateway(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if PUBLIC_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    match state.auth.as_ref() {
        AuthMode::Disabled => {
            request.extensions_mut().insert(ClientIdentity::anonymous());
            next.run(request).await
        }
        AuthMode::Static(authenticator) => {
            let token = match extract_bearer_token(request.headers()) {
                Ok(token) => token,
                Err(error) => return error.into_response(),
            };

            match authenticator.validate(&token) {
                Some(client_name) => {
                    info!(client = %client_name, path = %path, "Authenticated request");
                    request
                        .extensions_mut()
                        .insert(ClientIdentity::named(client_name));
                    next.run(request).await
                }
                None => {
                    warn!(
                        client_addr = extract_client_addr(request.headers()).as_deref(),
                        path = %path,
                        "Authentication failed"
                    );
                    ApiError::authentication("Invalid API key").into_response()
                }
            }
        }
        AuthMode::Database(authenticator) => {
            dispatch_database_mode(authenticator, request, next).await
        }
    }
}

/// Full validation pipeline: cache-backed lookup, three-window rate check,
/// batched usage accounting, and a usage log row for the final outcome.
async fn dispatch_database_mode(
    authenticator: &DatabaseAuthenticator,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let path = request.uri().path().to_string();
    let method = request.method().to_string();
    let client_addr = extract_client_addr(request.headers());
    let user_agent = extract_user_agent(request.headers());

    let token = match extract_bearer_token(request.headers()) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    let record = match authenticator.validate(&token).await {
        Some(record) => record,
        None => {
            warn!(
                client_addr = client_addr.as_deref(),
                path = %path,
                "Authentication failed"
            );

            authenticator.recorder().record(
                UsageLogEntry::new(UNKNOWN_CREDENTIAL, &path, &method, 401)
                    .with_client_addr(client_addr)
                    .with_user_agent(user_agent)
                    .with_error("Invalid or expired API key"),
            );

            return ApiError::authentication("Invalid or expired API key").into_response();
        }
    };

    let decision = authenticator.check_rate_limit(&record).await;

    if !decision.allowed {
        let window = decision.exceeded_window.unwrap_or(RateWindow::Minute);

        authenticator.recorder().record(
            UsageLogEntry::new(record.id().as_str(), &path, &method, 429)
                .with_client_addr(client_addr)
                .with_user_agent(user_agent)
                .with_error(format!("Rate limit exceeded: {}", window)),
        );

        return ApiError::rate_limited(window).into_response();
    }

    info!(client = %record.client_name(), path = %path, "Authenticated request");

    request
        .extensions_mut()
        .insert(ClientIdentity::new(record.id().clone(), record.client_name()));

    authenticator.recorder().touch(record.id()).await;

    let response = next.run(request).await;

    let latency_ms = started.elapsed().as_millis() as u64;
    authenticator.recorder().record(
        UsageLogEntry::new(
            record.id().as_str(),
            &path,
            &method,
            response.status().as_u16(),
        )
        .with_client_addr(client_addr)
        .with_user_agent(user_agent)
        .with_latency_ms(latency_ms),
    );

    response
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = match headers.get(header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| ApiError::authentication("Invalid Authorization header encoding"))?,
        None => {
            return Err(
                ApiError::authentication("Missing authentication credentials").with_details(
                    json!({
                        "required_header": "Authorization",
                        "format": "Authorization: Bearer <api_key>",
                    }),
                ),
            );
        }
    };

    match auth_header.strip_prefix("Bearer ") {
        Some(token) => Ok(token.trim().to_string()),
        None => {
            let received = auth_header.split_whitespace().next().unwrap_or("none");

            Err(
                ApiError::authentication("Invalid authentication format").with_details(json!({
                    "expected_format": "Authorization: Bearer <api_key>",
                    "received_format": received,
                })),
            )
        }
    }
}

fn extract_client_addr(headers: &HeaderMap) -> Option<String> {
    // behind a proxy the forwarded chain is the best we have
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());

    forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
    })
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}
