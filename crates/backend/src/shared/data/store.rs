use async_trait::async_trait;
use contracts::domain::a001_dimension::aggregate::Dimension;
use contracts::domain::a002_subdimension::aggregate::Subdimension;
use contracts::domain::a003_indicator::aggregate::IndicatorDefinition;
use contracts::projections::p001_indicator_result::dto::IndicatorResult;
use thiserror::Error;

/// Failure of a single round trip to the data source.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("query rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("cannot decode response: {0}")]
    Decode(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(e: sea_orm::DbErr) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

/// Ordering of result rows by period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodOrder {
    #[default]
    Unordered,
    Ascending,
    Descending,
}

/// Filter over `resultado_indicadores`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultQuery {
    pub indicator: String,
    /// Accepted territory names; empty means any territory
    pub territories: Vec<String>,
    pub period: Option<i32>,
    pub order: PeriodOrder,
    pub limit: Option<u64>,
}

impl ResultQuery {
    pub fn for_indicator(indicator: &str) -> Self {
        Self {
            indicator: indicator.to_string(),
            territories: Vec::new(),
            period: None,
            order: PeriodOrder::Unordered,
            limit: None,
        }
    }

    pub fn territory(mut self, territory: &str) -> Self {
        self.territories = vec![territory.to_string()];
        self
    }

    pub fn territories<S: AsRef<str>>(mut self, territories: &[S]) -> Self {
        self.territories = territories.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    pub fn period(mut self, period: i32) -> Self {
        self.period = Some(period);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = PeriodOrder::Descending;
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.order = PeriodOrder::Ascending;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a row satisfies the filter part of the query (not order/limit).
    pub fn accepts(&self, row: &IndicatorResult) -> bool {
        row.indicator_name == self.indicator
            && (self.territories.is_empty() || self.territories.contains(&row.territory))
            && self.period.map_or(true, |p| row.period == Some(p))
    }
}

/// Read-only query interface over the KPI tables.
///
/// Every call is an independent round trip; implementations do not promise
/// consistency between calls.
#[async_trait]
pub trait KpiStore: Send + Sync {
    /// All dimensions, heaviest first.
    async fn dimensions(&self) -> Result<Vec<Dimension>, StoreError>;

    /// All sub-dimensions ordered by dimension name, then weight.
    async fn subdimensions(&self) -> Result<Vec<Subdimension>, StoreError>;

    /// All indicator definitions ordered by name. With `with_active == false`
    /// the `activo` column is not requested and `active` is always `None`.
    async fn indicator_definitions(
        &self,
        with_active: bool,
    ) -> Result<Vec<IndicatorDefinition>, StoreError>;

    /// Names of the indicators that belong to one sub-dimension.
    async fn indicator_names(&self, subdimension: &str) -> Result<Vec<String>, StoreError>;

    async fn results(&self, query: &ResultQuery) -> Result<Vec<IndicatorResult>, StoreError>;

    /// Exact number of rows matching `query`; order and limit are ignored.
    async fn count_results(&self, query: &ResultQuery) -> Result<u64, StoreError>;
}
