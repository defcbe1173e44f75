use serde::{Deserialize, Serialize};

/// Subdivision of a dimension grouping related indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subdimension {
    pub name: String,
    /// Name of the owning dimension (`subdimensiones.nombre_dimension`)
    pub dimension_name: String,
    pub weight: f64,
}
