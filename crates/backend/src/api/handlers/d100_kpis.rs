use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use contracts::dashboards::d100_kpis::dto::{
    HistoryQuery, IndicatorFilter, IndicatorListResponse, IndicatorWithData,
};
use contracts::domain::a001_dimension::aggregate::Dimension;
use contracts::projections::p001_indicator_result::dto::HistoricalPoint;

use crate::api::AppState;
use crate::dashboards::d100_kpis::{export, service};
use crate::shared::cache::CacheKey;
use crate::shared::territory::{DEFAULT_HISTORY_LIMIT, NATIONAL_REFERENCE};

/// Base name of the exported CSV file.
const EXPORT_BASE_NAME: &str = "todos-indicadores";

/// Full indicator list, shared by the list and export endpoints.
async fn all_indicators(state: &AppState) -> Vec<IndicatorWithData> {
    let access = &state.access;
    state
        .cache
        .get_or_load(
            CacheKey::new("list_indicators_with_data").opt_arg(None::<&str>),
            || service::list_indicators_with_data(access, None),
        )
        .await
}

/// GET /api/d100/dimensions
pub async fn list_dimensions(State(state): State<AppState>) -> Json<Vec<Dimension>> {
    let access = &state.access;
    let dimensions = state
        .cache
        .get_or_load(CacheKey::new("list_dimensions"), || {
            service::list_dimensions(access)
        })
        .await;
    Json(dimensions)
}

/// GET /api/d100/indicators?search=&dimension=&subdimension=
pub async fn list_indicators(
    State(state): State<AppState>,
    Query(filter): Query<IndicatorFilter>,
) -> Json<IndicatorListResponse> {
    let indicators = all_indicators(&state).await;
    let items: Vec<IndicatorWithData> = filter.apply(&indicators).into_iter().cloned().collect();

    tracing::info!(
        "D100: Returning {} of {} indicators",
        items.len(),
        indicators.len()
    );

    Json(IndicatorListResponse {
        items,
        total: indicators.len(),
    })
}

/// GET /api/d100/export?search=&dimension=&subdimension=
pub async fn export_indicators(
    State(state): State<AppState>,
    Query(filter): Query<IndicatorFilter>,
) -> Result<Response, StatusCode> {
    let indicators = all_indicators(&state).await;
    let filtered = filter.apply(&indicators);

    let body = match export::indicators_to_csv(&filtered) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("D100: Failed to export indicators: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let file_name = export::export_file_name(EXPORT_BASE_NAME, chrono::Local::now().date_naive());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /api/d100/indicators/:name/history?territory=&limit=
pub async fn history(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<HistoricalPoint>> {
    let territory = query
        .territory
        .unwrap_or_else(|| NATIONAL_REFERENCE.to_string());
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    let access = &state.access;
    let points = state
        .cache
        .get_or_load(
            CacheKey::new("historical_series")
                .arg(&name)
                .arg(&territory)
                .arg(limit),
            || service::historical_series(access, &name, &territory, limit),
        )
        .await;
    Json(points)
}
