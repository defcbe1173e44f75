use serde::{Deserialize, Serialize};

/// Top-level category of the composite index (e.g. "Capital Humano").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    /// Unique, human-readable name as stored in `dimensiones.nombre`
    pub name: String,
    /// Relative importance inside the index
    pub weight: f64,
    /// URL-friendly identifier derived from the name
    pub id: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        let name = name.into();
        let id = slugify(&name);
        Self { name, weight, id }
    }
}

/// Derive the identifier of a dimension from its name.
///
/// Lowercases, collapses every whitespace run into a single `-` and folds the
/// accented vowels used in Spanish names (`á é í ó ú`) to plain ASCII.
/// Other characters are kept as they are.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut in_whitespace = false;

    for ch in lower.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        out.push(match ch {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        });
    }

    out
}
