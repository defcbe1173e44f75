use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::AppState;

#[derive(Debug, Deserialize)]
pub struct InvalidateParams {
    /// Query name ("dimension_score", ...); absent drops every entry
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub removed: usize,
}

/// POST /api/cache/invalidate?query=
pub async fn invalidate(
    State(state): State<AppState>,
    Query(params): Query<InvalidateParams>,
) -> Json<InvalidateResponse> {
    let removed = match params.query.as_deref() {
        Some(query) => state.cache.invalidate(query).await,
        None => state.cache.invalidate_all().await,
    };
    tracing::info!(
        "Cache invalidated ({}): {} entries",
        params.query.as_deref().unwrap_or("all"),
        removed
    );
    Json(InvalidateResponse { removed })
}
