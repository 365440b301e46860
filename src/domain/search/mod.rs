//! Downstream document-search contract
//!
//! The gateway treats retrieval as opaque: after a request is accepted it is
//! handed to a [`SearchBackend`] together with the resolved client identity,
//! and only the outcome status flows back into usage accounting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::credential::ClientIdentity;
use crate::domain::DomainError;

/// A document-search query as accepted by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// One retrieved document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

/// Results returned by the downstream backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

/// The downstream handler invoked only after the gateway accepts a request
#[async_trait]
pub trait SearchBackend: Send + Sync + Debug {
    async fn search(
        &self,
        request: SearchRequest,
        client: &ClientIdentity,
    ) -> Result<SearchResponse, DomainError>;
}
