use axum::{
    extract::{Path, Query, State},
    Json,
};
use contracts::dashboards::d100_kpis::dto::IndicatorWithData;
use contracts::dashboards::d101_dimension_detail::dto::{
    DimensionScoreResponse, DistributionEntry, ScoreQuery, SubdimensionCoverage,
    SubdimensionScore,
};

use crate::api::AppState;
use crate::dashboards::d100_kpis::service as kpis;
use crate::dashboards::d101_dimension_detail::service;
use crate::shared::cache::CacheKey;
use crate::shared::territory::{DEFAULT_PERIOD, NATIONAL_REFERENCE, REGION};

fn territory_and_period(query: ScoreQuery) -> (String, i32) {
    (
        query.territory.unwrap_or_else(|| REGION.to_string()),
        query.period.unwrap_or(DEFAULT_PERIOD),
    )
}

/// GET /api/d101/dimensions/:dimension/subdimensions?territory=&period=
pub async fn subdimension_scores(
    State(state): State<AppState>,
    Path(dimension): Path<String>,
    Query(query): Query<ScoreQuery>,
) -> Json<Vec<SubdimensionScore>> {
    let (territory, period) = territory_and_period(query);
    let access = &state.access;
    let scores = state
        .cache
        .get_or_load(
            CacheKey::new("subdimension_scores")
                .arg(&dimension)
                .arg(&territory)
                .arg(period),
            || service::subdimension_scores(access, &dimension, &territory, period),
        )
        .await;
    Json(scores)
}

/// GET /api/d101/dimensions/:dimension/score?territory=&period=
pub async fn dimension_score(
    State(state): State<AppState>,
    Path(dimension): Path<String>,
    Query(query): Query<ScoreQuery>,
) -> Json<DimensionScoreResponse> {
    let (territory, period) = territory_and_period(query);
    let access = &state.access;
    let score = state
        .cache
        .get_or_load(
            CacheKey::new("dimension_score")
                .arg(&dimension)
                .arg(&territory)
                .arg(period),
            || service::dimension_score(access, &dimension, &territory, period),
        )
        .await;

    tracing::info!(
        "D101: {} scores {} for {} in {}",
        dimension,
        score,
        territory,
        period
    );

    Json(DimensionScoreResponse {
        dimension,
        territory,
        period,
        score,
    })
}

/// GET /api/d101/dimensions/:dimension/distribution
pub async fn distribution(
    State(state): State<AppState>,
    Path(dimension): Path<String>,
) -> Json<Vec<DistributionEntry>> {
    let access = &state.access;
    let entries = state
        .cache
        .get_or_load(
            CacheKey::new("indicator_distribution").arg(&dimension),
            || service::indicator_distribution(access, &dimension),
        )
        .await;
    Json(entries)
}

/// GET /api/d101/dimensions/:dimension/coverage?territory=
///
/// Territory defaults to the national reference.
pub async fn coverage(
    State(state): State<AppState>,
    Path(dimension): Path<String>,
    Query(query): Query<ScoreQuery>,
) -> Json<Vec<SubdimensionCoverage>> {
    let territory = query
        .territory
        .unwrap_or_else(|| NATIONAL_REFERENCE.to_string());
    let access = &state.access;
    let entries = state
        .cache
        .get_or_load(
            CacheKey::new("subdimension_coverage")
                .arg(&dimension)
                .arg(&territory),
            || service::subdimension_coverage(access, &dimension, &territory),
        )
        .await;
    Json(entries)
}

/// GET /api/d101/subdimensions/:name/indicators
pub async fn indicators_by_subdimension(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<Vec<IndicatorWithData>> {
    let access = &state.access;
    let items = state
        .cache
        .get_or_load(
            CacheKey::new("indicators_by_subdimension").arg(&name),
            || kpis::indicators_by_subdimension(access, &name),
        )
        .await;
    Json(items)
}
