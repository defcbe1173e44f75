use contracts::domain::a001_dimension::aggregate::Dimension;
use contracts::domain::a002_subdimension::aggregate::Subdimension;
use contracts::domain::a003_indicator::aggregate::IndicatorDefinition;
use contracts::projections::p001_indicator_result::dto::IndicatorResult;
use std::sync::Arc;

use super::store::{KpiStore, ResultQuery, StoreError};
use crate::shared::diagnostics::{Diagnostics, Outcome, SharedDiagnostics, TracingDiagnostics};

/// Data access layer: one function per query shape.
///
/// Every function returns an `Outcome`; a failed round trip is reported to the
/// diagnostics sink and replaced by an empty or zero payload.
#[derive(Clone)]
pub struct DataAccess {
    store: Arc<dyn KpiStore>,
    diagnostics: SharedDiagnostics,
}

impl DataAccess {
    pub fn new(store: Arc<dyn KpiStore>, diagnostics: SharedDiagnostics) -> Self {
        Self { store, diagnostics }
    }

    /// Data access that logs failures through `tracing`.
    pub fn with_tracing(store: Arc<dyn KpiStore>) -> Self {
        Self::new(store, Arc::new(TracingDiagnostics))
    }

    pub fn diagnostics(&self) -> &dyn Diagnostics {
        self.diagnostics.as_ref()
    }

    fn settle<T: Default>(&self, operation: &str, result: Result<T, StoreError>) -> Outcome<T> {
        match result {
            Ok(value) => Outcome::ok(value),
            Err(e) => {
                self.diagnostics.query_failed(operation, &e);
                Outcome::degraded(T::default())
            }
        }
    }

    async fn first_result(
        &self,
        operation: &str,
        query: ResultQuery,
    ) -> Outcome<Option<IndicatorResult>> {
        let result = self
            .store
            .results(&query.limit(1))
            .await
            .map(|rows| rows.into_iter().next());
        self.settle(operation, result)
    }

    pub async fn dimensions(&self) -> Outcome<Vec<Dimension>> {
        self.settle("dimensions", self.store.dimensions().await)
    }

    pub async fn subdimensions(&self) -> Outcome<Vec<Subdimension>> {
        self.settle("subdimensions", self.store.subdimensions().await)
    }

    /// Sub-dimensions owned by `dimension`, in store order.
    pub async fn subdimensions_of(&self, dimension: &str) -> Outcome<Vec<Subdimension>> {
        self.subdimensions()
            .await
            .map(|subs| subs.into_iter().filter(|s| s.dimension_name == dimension).collect())
    }

    /// All indicator definitions.
    ///
    /// Older deployments have no `activo` column; when the store rejects the
    /// query because of it, the definitions are fetched again without it.
    pub async fn indicators(&self) -> Outcome<Vec<IndicatorDefinition>> {
        match self.store.indicator_definitions(true).await {
            Ok(defs) => Outcome::ok(defs),
            Err(e) if e.to_string().contains("activo") => {
                self.diagnostics
                    .note("indicators", "activo column unavailable, fetching without it");
                self.settle("indicators", self.store.indicator_definitions(false).await)
            }
            Err(e) => {
                self.diagnostics.query_failed("indicators", &e);
                Outcome::degraded(Vec::new())
            }
        }
    }

    pub async fn indicator_names(&self, subdimension: &str) -> Outcome<Vec<String>> {
        self.settle("indicator_names", self.store.indicator_names(subdimension).await)
    }

    /// Newest result of an indicator over every territory.
    pub async fn latest_result(&self, indicator: &str) -> Outcome<Option<IndicatorResult>> {
        self.first_result(
            "latest_result",
            ResultQuery::for_indicator(indicator).newest_first(),
        )
        .await
    }

    pub async fn result_count(&self, indicator: &str) -> Outcome<u64> {
        self.settle(
            "result_count",
            self.store
                .count_results(&ResultQuery::for_indicator(indicator))
                .await,
        )
    }

    pub async fn territory_result_count(&self, indicator: &str, territory: &str) -> Outcome<u64> {
        self.settle(
            "territory_result_count",
            self.store
                .count_results(&ResultQuery::for_indicator(indicator).territory(territory))
                .await,
        )
    }

    /// A result at exactly `period` for `territory`, if any.
    pub async fn result_at(
        &self,
        indicator: &str,
        territory: &str,
        period: i32,
    ) -> Outcome<Option<IndicatorResult>> {
        self.first_result(
            "result_at",
            ResultQuery::for_indicator(indicator)
                .territory(territory)
                .period(period),
        )
        .await
    }

    /// Newest result for `territory`, whatever its period.
    pub async fn latest_for_territory(
        &self,
        indicator: &str,
        territory: &str,
    ) -> Outcome<Option<IndicatorResult>> {
        self.first_result(
            "latest_for_territory",
            ResultQuery::for_indicator(indicator)
                .territory(territory)
                .newest_first(),
        )
        .await
    }

    /// Results at exactly `period` for any of `territories`.
    pub async fn results_at(
        &self,
        indicator: &str,
        territories: &[&str],
        period: i32,
        limit: u64,
    ) -> Outcome<Vec<IndicatorResult>> {
        let query = ResultQuery::for_indicator(indicator)
            .territories(territories)
            .period(period)
            .limit(limit);
        self.settle("results_at", self.store.results(&query).await)
    }

    /// Oldest-first results of one indicator for one territory.
    pub async fn history(
        &self,
        indicator: &str,
        territory: &str,
        limit: u64,
    ) -> Outcome<Vec<IndicatorResult>> {
        let query = ResultQuery::for_indicator(indicator)
            .territory(territory)
            .oldest_first()
            .limit(limit);
        self.settle("history", self.store.results(&query).await)
    }
}
