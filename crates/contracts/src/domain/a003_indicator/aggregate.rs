use serde::{Deserialize, Serialize};

/// Definition of a named metric (`definicion_indicadores`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    pub name: String,
    pub subdimension_name: String,
    pub importance: Option<String>,
    pub formula: Option<String>,
    pub source: Option<String>,
    pub origin: Option<String>,
    /// Stored activation flag. `None` when the deployment has no such column
    /// or the row leaves it empty. Serialized as `stored_active` so it does
    /// not collide with the resolved flag of `IndicatorWithData`.
    #[serde(rename = "stored_active", default)]
    pub active: Option<bool>,
}
