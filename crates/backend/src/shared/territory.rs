use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Region the dashboard reports on.
pub const REGION: &str = "Comunitat Valenciana";
/// National reference territory.
pub const NATIONAL_REFERENCE: &str = "España";
/// Peer countries averaged into the regional-bloc reference.
pub const BLOC_REFERENCES: [&str; 4] = ["Alemania", "Francia", "Italia", "Países Bajos"];
/// Year shown when the caller does not pick one.
pub const DEFAULT_PERIOD: i32 = 2024;
/// Number of points of a historical series when the caller does not pick one.
pub const DEFAULT_HISTORY_LIMIT: u64 = 10;

/// Spellings under which results of a territory have been loaded, in lookup
/// order.
static NAME_VARIANTS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert(
        REGION,
        &["Comunitat Valenciana", "Comunidad Valenciana", "Valencia", "CV"],
    );
    m.insert(NATIONAL_REFERENCE, &["España", "Spain", "Esp"]);
    m
});

/// Known name variants of `territory`; unknown territories map to themselves.
pub fn name_variants(territory: &str) -> Vec<String> {
    match NAME_VARIANTS.get(territory) {
        Some(variants) => variants.iter().map(|v| v.to_string()).collect(),
        None => vec![territory.to_string()],
    }
}
