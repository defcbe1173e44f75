use async_trait::async_trait;
use contracts::domain::a001_dimension::aggregate::Dimension;
use contracts::domain::a002_subdimension::aggregate::Subdimension;
use contracts::domain::a003_indicator::aggregate::IndicatorDefinition;
use contracts::projections::p001_indicator_result::dto::IndicatorResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::store::{KpiStore, PeriodOrder, ResultQuery, StoreError};

const RESULT_COLUMNS: &str = "nombre_indicador,pais,periodo,valor_calculado";
const DEFINITION_COLUMNS: &str =
    "nombre,nombre_subdimension,importancia,formula,fuente,origen_indicador";

// ---------------------------------------------------------------------------
// Wire rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DimensionRow {
    nombre: String,
    #[serde(default, deserialize_with = "lenient_number")]
    peso: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SubdimensionRow {
    nombre: String,
    nombre_dimension: String,
    #[serde(default, deserialize_with = "lenient_number")]
    peso: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DefinitionRow {
    nombre: String,
    nombre_subdimension: String,
    #[serde(default)]
    importancia: Option<String>,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default)]
    fuente: Option<String>,
    #[serde(default)]
    origen_indicador: Option<String>,
    #[serde(default)]
    activo: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct NameRow {
    nombre: String,
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    nombre_indicador: String,
    #[serde(default)]
    pais: Option<String>,
    #[serde(default)]
    periodo: Option<i32>,
    #[serde(default, deserialize_with = "lenient_number")]
    valor_calculado: Option<f64>,
}

/// Numeric columns may arrive as JSON numbers or as strings (`numeric` type).
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl From<ResultRow> for IndicatorResult {
    fn from(r: ResultRow) -> Self {
        IndicatorResult {
            indicator_name: r.nombre_indicador,
            territory: r.pais.unwrap_or_default(),
            period: r.periodo,
            value: r.valor_calculado,
        }
    }
}

impl From<DefinitionRow> for IndicatorDefinition {
    fn from(r: DefinitionRow) -> Self {
        IndicatorDefinition {
            name: r.nombre,
            subdimension_name: r.nombre_subdimension,
            importance: r.importancia,
            formula: r.formula,
            source: r.fuente,
            origin: r.origen_indicador,
            active: r.activo,
        }
    }
}

// ---------------------------------------------------------------------------
// Query string building
// ---------------------------------------------------------------------------

/// Quote a value for a PostgREST `in.(...)` list.
fn quote_list_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Filter parameters shared by row and count requests.
fn result_filters(query: &ResultQuery) -> Vec<(String, String)> {
    let mut params = vec![(
        "nombre_indicador".to_string(),
        format!("eq.{}", query.indicator),
    )];

    match query.territories.as_slice() {
        [] => {}
        [single] => params.push(("pais".to_string(), format!("eq.{}", single))),
        many => {
            let list: Vec<String> = many.iter().map(|t| quote_list_value(t)).collect();
            params.push(("pais".to_string(), format!("in.({})", list.join(","))));
        }
    }

    if let Some(period) = query.period {
        params.push(("periodo".to_string(), format!("eq.{}", period)));
    }

    params
}

fn result_params(query: &ResultQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), RESULT_COLUMNS.to_string())];
    params.extend(result_filters(query));

    match query.order {
        PeriodOrder::Unordered => {}
        PeriodOrder::Ascending => {
            params.push(("order".to_string(), "periodo.asc.nullslast".to_string()))
        }
        PeriodOrder::Descending => {
            params.push(("order".to_string(), "periodo.desc.nullslast".to_string()))
        }
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

/// Total from a `Content-Range` header such as `0-0/42` or `*/42`.
fn parse_content_range(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// `KpiStore` over a hosted PostgREST endpoint (Supabase REST API).
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> Result<Vec<T>, StoreError> {
        tracing::debug!("PostgREST GET {} {:?}", table, params);

        let response = self
            .request(reqwest::Method::GET, table)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let rows = response.json::<Vec<T>>().await?;
        Ok(rows)
    }
}

#[async_trait]
impl KpiStore for PostgrestStore {
    async fn dimensions(&self) -> Result<Vec<Dimension>, StoreError> {
        let rows: Vec<DimensionRow> = self
            .fetch(
                "dimensiones",
                &[
                    ("select".into(), "nombre,peso".into()),
                    ("order".into(), "peso.desc".into()),
                ],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Dimension::new(r.nombre, r.peso.unwrap_or(0.0)))
            .collect())
    }

    async fn subdimensions(&self) -> Result<Vec<Subdimension>, StoreError> {
        let rows: Vec<SubdimensionRow> = self
            .fetch(
                "subdimensiones",
                &[
                    ("select".into(), "nombre,nombre_dimension,peso".into()),
                    ("order".into(), "nombre_dimension.asc,peso.asc".into()),
                ],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Subdimension {
                name: r.nombre,
                dimension_name: r.nombre_dimension,
                weight: r.peso.unwrap_or(0.0),
            })
            .collect())
    }

    async fn indicator_definitions(
        &self,
        with_active: bool,
    ) -> Result<Vec<IndicatorDefinition>, StoreError> {
        let columns = if with_active {
            format!("{},activo", DEFINITION_COLUMNS)
        } else {
            DEFINITION_COLUMNS.to_string()
        };
        let rows: Vec<DefinitionRow> = self
            .fetch(
                "definicion_indicadores",
                &[("select".into(), columns), ("order".into(), "nombre.asc".into())],
            )
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn indicator_names(&self, subdimension: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<NameRow> = self
            .fetch(
                "definicion_indicadores",
                &[
                    ("select".into(), "nombre".into()),
                    ("nombre_subdimension".into(), format!("eq.{}", subdimension)),
                    ("order".into(), "nombre.asc".into()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.nombre).collect())
    }

    async fn results(&self, query: &ResultQuery) -> Result<Vec<IndicatorResult>, StoreError> {
        let rows: Vec<ResultRow> = self
            .fetch("resultado_indicadores", &result_params(query))
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_results(&self, query: &ResultQuery) -> Result<u64, StoreError> {
        let response = self
            .request(reqwest::Method::HEAD, "resultado_indicadores")
            .header("Prefer", "count=exact")
            .query(&[("select".to_string(), "nombre_indicador".to_string())])
            .query(&result_filters(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| StoreError::Decode("missing or invalid Content-Range".to_string()))
    }
}
