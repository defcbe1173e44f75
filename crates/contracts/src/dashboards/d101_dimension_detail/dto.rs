use serde::{Deserialize, Serialize};

/// Scores of one sub-dimension, all within [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubdimensionScore {
    pub name: String,
    /// Mean for the requested territory
    pub score: f64,
    /// Mean for the national reference ("España")
    pub national: f64,
    /// Mean for the regional bloc of reference countries
    pub bloc: f64,
    /// Number of indicators defined for the sub-dimension
    pub indicator_count: usize,
}

impl SubdimensionScore {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0.0,
            national: 0.0,
            bloc: 0.0,
            indicator_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScoreResponse {
    pub dimension: String,
    pub territory: String,
    pub period: i32,
    pub score: i64,
}

/// Share of a dimension's indicators held by one sub-dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub name: String,
    pub indicator_count: usize,
    /// Independently rounded, the entries need not sum to 100
    pub percentage: i64,
}

/// How many indicators of a sub-dimension have data for a territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubdimensionCoverage {
    pub name: String,
    pub total_indicators: usize,
    pub indicators_with_data: usize,
}

/// Filter tuple of the dimension detail page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreQuery {
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub period: Option<i32>,
}
