use serde::{Deserialize, Serialize};

use crate::domain::a003_indicator::aggregate::IndicatorDefinition;

/// Indicator definition joined with its owning dimension and latest result.
///
/// Computed on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorWithData {
    #[serde(flatten)]
    pub definition: IndicatorDefinition,
    /// Owning dimension, empty when the sub-dimension is unknown
    pub dimension: String,
    pub subdimension: String,
    pub latest_value: Option<f64>,
    pub latest_period: Option<i32>,
    pub total_results: u64,
    /// Stored flag when present, otherwise whether a latest value exists
    pub active: bool,
}

impl IndicatorWithData {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Whether the indicator belongs in the leading block of the list.
    pub fn is_listed_first(&self) -> bool {
        self.active || self.latest_value.is_some()
    }

    /// Latest value scaled for the progress bars of the indicator table.
    pub fn normalized_value(&self) -> f64 {
        normalized_value(self.latest_value)
    }
}

/// Display normalisation: missing or zero values render as 0, anything else
/// is clamped to [0, 100].
pub fn normalized_value(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v != 0.0 => v.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Filters applied to the already fetched indicator list.
///
/// `None` stands for "all dimensions" / "all sub-dimensions" / no search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub dimension: Option<String>,
    #[serde(default)]
    pub subdimension: Option<String>,
}

impl IndicatorFilter {
    pub fn matches(&self, indicator: &IndicatorWithData) -> bool {
        let matches_search = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => indicator
                .name()
                .to_lowercase()
                .contains(&text.to_lowercase()),
        };
        let matches_dimension = self
            .dimension
            .as_deref()
            .map_or(true, |d| indicator.dimension == d);
        let matches_subdimension = self
            .subdimension
            .as_deref()
            .map_or(true, |s| indicator.subdimension == s);

        matches_search && matches_dimension && matches_subdimension
    }

    pub fn apply<'a>(&self, indicators: &'a [IndicatorWithData]) -> Vec<&'a IndicatorWithData> {
        indicators.iter().filter(|i| self.matches(i)).collect()
    }
}

/// Response of the indicator list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorListResponse {
    pub items: Vec<IndicatorWithData>,
    /// Size of the unfiltered list ("Mostrando N de M indicadores")
    pub total: usize,
}

/// Query parameters of the historical series endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}
