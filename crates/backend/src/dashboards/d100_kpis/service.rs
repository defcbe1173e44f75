use contracts::dashboards::d100_kpis::dto::IndicatorWithData;
use contracts::domain::a001_dimension::aggregate::Dimension;
use contracts::domain::a003_indicator::aggregate::IndicatorDefinition;
use contracts::projections::p001_indicator_result::dto::HistoricalPoint;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};

use crate::shared::data::access::DataAccess;
use crate::shared::diagnostics::Outcome;

/// All dimensions, heaviest first, with their derived identifiers.
pub async fn list_dimensions(access: &DataAccess) -> Outcome<Vec<Dimension>> {
    access.dimensions().await
}

/// Indicator definitions joined with their latest result and result count.
///
/// With `dimension`, only indicators whose sub-dimension belongs to it are
/// kept. Active indicators (or ones with a latest value) come first; the
/// relative order inside each block is the store's name order.
pub async fn list_indicators_with_data(
    access: &DataAccess,
    dimension: Option<&str>,
) -> Outcome<Vec<IndicatorWithData>> {
    let mut outcome = Outcome::ok(());
    let mut definitions = outcome.absorb(access.indicators().await);
    let subdimensions = outcome.absorb(access.subdimensions().await);

    if let Some(dimension) = dimension {
        let owned: HashSet<&str> = subdimensions
            .iter()
            .filter(|s| s.dimension_name == dimension)
            .map(|s| s.name.as_str())
            .collect();
        definitions.retain(|d| owned.contains(d.subdimension_name.as_str()));
    }

    let dimension_of: HashMap<&str, &str> = subdimensions
        .iter()
        .map(|s| (s.name.as_str(), s.dimension_name.as_str()))
        .collect();

    let enriched = join_all(definitions.into_iter().map(|definition| {
        let dimension = dimension_of
            .get(definition.subdimension_name.as_str())
            .map(|d| d.to_string())
            .unwrap_or_default();
        with_data(access, definition, dimension)
    }))
    .await;

    let mut items: Vec<IndicatorWithData> =
        enriched.into_iter().map(|o| outcome.absorb(o)).collect();
    // Stable: keeps name order inside both blocks
    items.sort_by_key(|i| !i.is_listed_first());

    outcome.map(|_| items)
}

async fn with_data(
    access: &DataAccess,
    definition: IndicatorDefinition,
    dimension: String,
) -> Outcome<IndicatorWithData> {
    let (latest, count) = futures::join!(
        access.latest_result(&definition.name),
        access.result_count(&definition.name)
    );

    let mut outcome = Outcome::ok(());
    let latest = outcome.absorb(latest);
    let total_results = outcome.absorb(count);

    // A stored 0 reads as no value.
    let latest_value = latest
        .as_ref()
        .and_then(|r| r.value)
        .filter(|v| *v != 0.0);
    let latest_period = latest.as_ref().and_then(|r| r.period).filter(|p| *p != 0);
    let active = definition.active.unwrap_or(latest_value.is_some());
    let subdimension = definition.subdimension_name.clone();

    outcome.map(|_| IndicatorWithData {
        definition,
        dimension,
        subdimension,
        latest_value,
        latest_period,
        total_results,
        active,
    })
}

/// Oldest-first series of one indicator for one territory. Missing values
/// and periods read as 0.
pub async fn historical_series(
    access: &DataAccess,
    indicator: &str,
    territory: &str,
    limit: u64,
) -> Outcome<Vec<HistoricalPoint>> {
    access
        .history(indicator, territory, limit)
        .await
        .map(|rows| rows.iter().map(HistoricalPoint::from).collect())
}

/// The indicator list restricted to one sub-dimension.
pub async fn indicators_by_subdimension(
    access: &DataAccess,
    subdimension: &str,
) -> Outcome<Vec<IndicatorWithData>> {
    list_indicators_with_data(access, None).await.map(|items| {
        items
            .into_iter()
            .filter(|i| i.subdimension == subdimension)
            .collect()
    })
}
