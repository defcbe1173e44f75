//! In-memory `KpiStore` for unit tests, with failure injection.

use async_trait::async_trait;
use contracts::domain::a001_dimension::aggregate::Dimension;
use contracts::domain::a002_subdimension::aggregate::Subdimension;
use contracts::domain::a003_indicator::aggregate::IndicatorDefinition;
use contracts::projections::p001_indicator_result::dto::IndicatorResult;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::store::{KpiStore, PeriodOrder, ResultQuery, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    pub dimensions: Vec<Dimension>,
    pub subdimensions: Vec<Subdimension>,
    pub definitions: Vec<IndicatorDefinition>,
    pub results: Vec<IndicatorResult>,
    /// Behave like a deployment whose definitions table lacks `activo`
    pub without_active_column: bool,
    /// Operation names ("dimensions", "results", ...) that fail
    pub failing: HashSet<&'static str>,
    /// Indicators whose result queries fail
    pub failing_indicators: HashSet<String>,
    pub calls: AtomicUsize,
    pub queries: Mutex<Vec<ResultQuery>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimension(mut self, name: &str, weight: f64) -> Self {
        self.dimensions.push(Dimension::new(name, weight));
        self
    }

    pub fn subdimension(mut self, name: &str, dimension: &str, weight: f64) -> Self {
        self.subdimensions.push(Subdimension {
            name: name.to_string(),
            dimension_name: dimension.to_string(),
            weight,
        });
        self
    }

    pub fn indicator(mut self, name: &str, subdimension: &str, active: Option<bool>) -> Self {
        self.definitions.push(IndicatorDefinition {
            name: name.to_string(),
            subdimension_name: subdimension.to_string(),
            active,
            ..Default::default()
        });
        self
    }

    pub fn result(mut self, indicator: &str, territory: &str, period: i32, value: f64) -> Self {
        self.results.push(IndicatorResult {
            indicator_name: indicator.to_string(),
            territory: territory.to_string(),
            period: Some(period),
            value: Some(value),
        });
        self
    }

    pub fn raw_result(mut self, result: IndicatorResult) -> Self {
        self.results.push(result);
        self
    }

    pub fn fail(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn fail_indicator(mut self, indicator: &str) -> Self {
        self.failing_indicators.insert(indicator.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, operation: &'static str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(operation) {
            return Err(StoreError::Transport(format!("{operation} unavailable")));
        }
        Ok(())
    }

    fn matching(&self, query: &ResultQuery) -> Result<Vec<IndicatorResult>, StoreError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.failing_indicators.contains(&query.indicator) {
            return Err(StoreError::Rejected {
                status: 503,
                body: format!("{} unavailable", query.indicator),
            });
        }
        Ok(self
            .results
            .iter()
            .filter(|r| query.accepts(r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl KpiStore for MemoryStore {
    async fn dimensions(&self) -> Result<Vec<Dimension>, StoreError> {
        self.enter("dimensions")?;
        let mut dims = self.dimensions.clone();
        dims.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        Ok(dims)
    }

    async fn subdimensions(&self) -> Result<Vec<Subdimension>, StoreError> {
        self.enter("subdimensions")?;
        let mut subs = self.subdimensions.clone();
        subs.sort_by(|a, b| {
            a.dimension_name
                .cmp(&b.dimension_name)
                .then(a.weight.total_cmp(&b.weight))
        });
        Ok(subs)
    }

    async fn indicator_definitions(
        &self,
        with_active: bool,
    ) -> Result<Vec<IndicatorDefinition>, StoreError> {
        self.enter("indicator_definitions")?;
        if with_active && self.without_active_column {
            return Err(StoreError::Rejected {
                status: 400,
                body: "column definicion_indicadores.activo does not exist".to_string(),
            });
        }
        let mut defs = self.definitions.clone();
        if !with_active {
            defs.iter_mut().for_each(|d| d.active = None);
        }
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(defs)
    }

    async fn indicator_names(&self, subdimension: &str) -> Result<Vec<String>, StoreError> {
        self.enter("indicator_names")?;
        let mut names: Vec<String> = self
            .definitions
            .iter()
            .filter(|d| d.subdimension_name == subdimension)
            .map(|d| d.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn results(&self, query: &ResultQuery) -> Result<Vec<IndicatorResult>, StoreError> {
        self.enter("results")?;
        let mut rows = self.matching(query)?;
        match query.order {
            PeriodOrder::Unordered => {}
            // Null periods last in both directions
            PeriodOrder::Ascending => rows.sort_by_key(|r| (r.period.is_none(), r.period)),
            PeriodOrder::Descending => rows.sort_by_key(|r| std::cmp::Reverse(r.period)),
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn count_results(&self, query: &ResultQuery) -> Result<u64, StoreError> {
        self.enter("count_results")?;
        Ok(self.matching(query)?.len() as u64)
    }
}
