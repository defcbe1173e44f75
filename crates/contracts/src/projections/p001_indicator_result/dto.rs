use serde::{Deserialize, Serialize};

/// One computed value of an indicator for a territory and year
/// (`resultado_indicadores`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub indicator_name: String,
    pub territory: String,
    pub period: Option<i32>,
    pub value: Option<f64>,
}

/// Point of a historical series as plotted by the evolution charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub period: i32,
    pub value: f64,
}

impl From<&IndicatorResult> for HistoricalPoint {
    fn from(r: &IndicatorResult) -> Self {
        Self {
            period: r.period.unwrap_or(0),
            value: r.value.unwrap_or(0.0),
        }
    }
}
