use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;
use crate::system;

/// All application routes.
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // D100 KPI OVERVIEW
        // ========================================
        .route(
            "/api/d100/dimensions",
            get(handlers::d100_kpis::list_dimensions),
        )
        .route(
            "/api/d100/indicators",
            get(handlers::d100_kpis::list_indicators),
        )
        .route(
            "/api/d100/indicators/:name/history",
            get(handlers::d100_kpis::history),
        )
        .route(
            "/api/d100/export",
            get(handlers::d100_kpis::export_indicators),
        )
        // ========================================
        // D101 DIMENSION DETAIL
        // ========================================
        .route(
            "/api/d101/dimensions/:dimension/subdimensions",
            get(handlers::d101_dimension_detail::subdimension_scores),
        )
        .route(
            "/api/d101/dimensions/:dimension/score",
            get(handlers::d101_dimension_detail::dimension_score),
        )
        .route(
            "/api/d101/dimensions/:dimension/distribution",
            get(handlers::d101_dimension_detail::distribution),
        )
        .route(
            "/api/d101/dimensions/:dimension/coverage",
            get(handlers::d101_dimension_detail::coverage),
        )
        .route(
            "/api/d101/subdimensions/:name/indicators",
            get(handlers::d101_dimension_detail::indicators_by_subdimension),
        )
        // Cache
        .route(
            "/api/cache/invalidate",
            post(handlers::cache::invalidate),
        )
        .layer(middleware::from_fn(system::middleware::request_logger))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::cache::QueryCache;
    use crate::shared::data::access::DataAccess;
    use crate::shared::data::memory_store::MemoryStore;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use contracts::dashboards::d100_kpis::dto::IndicatorListResponse;
    use contracts::dashboards::d101_dimension_detail::dto::{
        DimensionScoreResponse, SubdimensionScore,
    };
    use contracts::projections::p001_indicator_result::dto::HistoricalPoint;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .dimension("Capital Humano", 0.4)
            .subdimension("Talento", "Capital Humano", 1.0)
            .indicator("Especialistas TIC", "Talento", None)
            .indicator("Graduados STEM", "Talento", None)
            .result("Especialistas TIC", "Comunitat Valenciana", 2024, 70.0)
            .result("Especialistas TIC", "España", 2023, 55.0)
            .result("Especialistas TIC", "España", 2024, 65.0)
            .result("Graduados STEM", "España", 2024, 30.0)
    }

    fn app_with(store: Arc<MemoryStore>) -> Router {
        let state = AppState::new(
            DataAccess::with_tracing(store),
            QueryCache::new(Duration::from_secs(60), 0),
        );
        configure_routes(state)
    }

    fn app() -> Router {
        app_with(Arc::new(store()))
    }

    async fn send(app: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(app: Router, uri: &str) -> T {
        let (status, body) = send(app, "GET", uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_indicator_list_is_filtered_after_fetch() {
        let response: IndicatorListResponse =
            get_json(app(), "/api/d100/indicators?search=stem").await;
        assert_eq!(response.total, 2);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].name(), "Graduados STEM");
        assert_eq!(response.items[0].dimension, "Capital Humano");
    }

    #[tokio::test]
    async fn test_history_defaults_to_national_reference() {
        let points: Vec<HistoricalPoint> = get_json(
            app(),
            "/api/d100/indicators/Especialistas%20TIC/history",
        )
        .await;
        assert_eq!(
            points,
            vec![
                HistoricalPoint { period: 2023, value: 55.0 },
                HistoricalPoint { period: 2024, value: 65.0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_dimension_score_defaults() {
        let response: DimensionScoreResponse =
            get_json(app(), "/api/d101/dimensions/Capital%20Humano/score").await;
        assert_eq!(response.territory, "Comunitat Valenciana");
        assert_eq!(response.period, 2024);
        assert_eq!(response.score, 70);
    }

    #[tokio::test]
    async fn test_subdimension_scores_with_explicit_filters() {
        let scores: Vec<SubdimensionScore> = get_json(
            app(),
            "/api/d101/dimensions/Capital%20Humano/subdimensions?territory=Espa%C3%B1a&period=2023",
        )
        .await;
        assert_eq!(scores.len(), 1);
        // Especialistas TIC at 2023 (55), Graduados STEM falls back to 2024 (30)
        assert_eq!(scores[0].score, 42.5);
        assert_eq!(scores[0].indicator_count, 2);
    }

    #[tokio::test]
    async fn test_export_is_csv_attachment() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/d100/export?search=tic")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"todos-indicadores-"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Especialistas TIC"));
    }

    #[tokio::test]
    async fn test_responses_are_cached_until_invalidated() {
        let store = Arc::new(store());
        let app = app_with(store.clone());

        let _: Vec<serde_json::Value> = get_json(app.clone(), "/api/d100/dimensions").await;
        let calls = store.call_count();
        let _: Vec<serde_json::Value> = get_json(app.clone(), "/api/d100/dimensions").await;
        assert_eq!(store.call_count(), calls);

        let (status, body) = send(
            app.clone(),
            "POST",
            "/api/cache/invalidate?query=list_dimensions",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let removed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(removed["removed"], 1);

        let _: Vec<serde_json::Value> = get_json(app, "/api/d100/dimensions").await;
        assert_eq!(store.call_count(), calls + 1);
    }

    #[tokio::test]
    async fn test_store_failure_yields_empty_payload() {
        let app = app_with(Arc::new(store().fail("subdimensions")));
        let scores: Vec<SubdimensionScore> =
            get_json(app, "/api/d101/dimensions/Capital%20Humano/subdimensions").await;
        assert!(scores.is_empty());
    }
}
