//! Search endpoint: hands accepted requests to the downstream backend

use axum::{extract::State, Extension};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{ClientIdentity, SearchRequest, SearchResponse};

/// Forward a search request to the downstream handler with the resolved
/// owner identity attached for attribution.
pub async fn search(
    State(state): State<AppState>,
    Extension(identity): Extension<ClientIdentity>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = state.search.search(request, &identity).await?;
    Ok(Json(response))
}
