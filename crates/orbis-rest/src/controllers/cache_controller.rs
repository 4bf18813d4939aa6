//! Cache administration endpoint.
//!
//! The hook a data reload calls once it has written new rows.

use crate::{
    responses::{at_path, messages, ApiResponse, ApiResult},
    state::AppState,
};
use axum::{
    extract::{OriginalUri, Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Query parameters for invalidation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateQuery {
    /// Glob pattern to invalidate. Every geographic prefix when absent.
    #[serde(default)]
    pub pattern: Option<String>,
}

/// Invalidation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub pattern: Option<String>,
    pub deleted: u64,
}

/// Creates the cache router.
pub fn router() -> Router<AppState> {
    Router::new().route("/invalidate", post(invalidate))
}

async fn invalidate(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<InvalidateQuery>,
) -> ApiResult<InvalidateResponse> {
    let pattern = query.pattern.filter(|p| !p.trim().is_empty());

    let deleted = match pattern.as_deref() {
        Some(pattern) => state.geo_service.invalidate_pattern(pattern).await,
        None => state.geo_service.invalidate_listings().await,
    }
    .map_err(at_path(uri.path()))?;

    info!(pattern = ?pattern, deleted, "Cache invalidation requested");
    Ok(Json(ApiResponse::ok(
        InvalidateResponse { pattern, deleted },
        messages::CACHE_INVALIDATED,
    )))
}
