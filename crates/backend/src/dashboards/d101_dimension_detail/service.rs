use contracts::dashboards::d101_dimension_detail::dto::{
    DistributionEntry, SubdimensionCoverage, SubdimensionScore,
};
use futures::future::join_all;
use std::collections::HashMap;

use crate::shared::data::access::DataAccess;
use crate::shared::diagnostics::Outcome;
use crate::shared::territory::{name_variants, BLOC_REFERENCES, NATIONAL_REFERENCE};

/// Scores of every sub-dimension of `dimension` for `territory` at `period`,
/// next to the national and regional-bloc references.
///
/// Each indicator contributes the value for the requested period, or the
/// newest value of the territory when that period is missing. Name variants
/// of the territory are tried in order. Indicators without any value are left
/// out of the mean; a failed lookup only drops the indicator it belongs to.
pub async fn subdimension_scores(
    access: &DataAccess,
    dimension: &str,
    territory: &str,
    period: i32,
) -> Outcome<Vec<SubdimensionScore>> {
    let mut outcome = Outcome::ok(());
    let subdimensions = outcome.absorb(access.subdimensions_of(dimension).await);
    access.diagnostics().note(
        "subdimension_scores",
        &format!("{} sub-dimensions in {}", subdimensions.len(), dimension),
    );

    let variants = name_variants(territory);
    let scored = join_all(
        subdimensions
            .iter()
            .map(|s| score_subdimension(access, &s.name, &variants, period)),
    )
    .await;

    let scores: Vec<SubdimensionScore> = scored.into_iter().map(|o| outcome.absorb(o)).collect();
    outcome.map(|_| scores)
}

async fn score_subdimension(
    access: &DataAccess,
    name: &str,
    variants: &[String],
    period: i32,
) -> Outcome<SubdimensionScore> {
    let mut outcome = Outcome::ok(());
    let indicators = outcome.absorb(access.indicator_names(name).await);
    if indicators.is_empty() {
        access
            .diagnostics()
            .note("subdimension_scores", &format!("no indicators in {}", name));
        return outcome.map(|_| SubdimensionScore::empty(name));
    }

    let national = [NATIONAL_REFERENCE.to_string()];
    let (territory_values, national_values, bloc_values) = futures::join!(
        join_all(indicators.iter().map(|i| resolve_value(access, i, variants, period))),
        join_all(indicators.iter().map(|i| resolve_value(access, i, &national, period))),
        join_all(indicators.iter().map(|i| bloc_value(access, i, period))),
    );

    let mut collect = |values: Vec<Outcome<Option<f64>>>| -> Vec<Option<f64>> {
        values.into_iter().map(|o| outcome.absorb(o)).collect()
    };
    let score = clamped_mean(collect(territory_values));
    let national = clamped_mean(collect(national_values));
    let bloc = clamped_mean(collect(bloc_values));

    outcome.map(|_| SubdimensionScore {
        name: name.to_string(),
        score,
        national,
        bloc,
        indicator_count: indicators.len(),
    })
}

/// Value of `indicator` for the first territory variant that has any row:
/// the row at `period`, else the newest row of that variant. A stored 0
/// reads as no value.
async fn resolve_value(
    access: &DataAccess,
    indicator: &str,
    variants: &[String],
    period: i32,
) -> Outcome<Option<f64>> {
    let mut outcome = Outcome::ok(());
    for variant in variants {
        if let Some(row) = outcome.absorb(access.result_at(indicator, variant, period).await) {
            return outcome.map(|_| nonzero(row.value));
        }
        if let Some(row) = outcome.absorb(access.latest_for_territory(indicator, variant).await) {
            return outcome.map(|_| nonzero(row.value));
        }
    }
    access.diagnostics().note(
        "subdimension_scores",
        &format!("no data for {} in {:?}", indicator, variants),
    );
    outcome.map(|_| None)
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// Mean over the bloc countries at exactly `period`; null values count as 0.
async fn bloc_value(access: &DataAccess, indicator: &str, period: i32) -> Outcome<Option<f64>> {
    access
        .results_at(indicator, &BLOC_REFERENCES, period, BLOC_REFERENCES.len() as u64)
        .await
        .map(|rows| {
            if rows.is_empty() {
                return None;
            }
            let sum: f64 = rows.iter().map(|r| r.value.unwrap_or(0.0)).sum();
            Some(sum / rows.len() as f64)
        })
}

/// Mean of the present finite values, clamped to [0, 100]; 0 when none.
fn clamped_mean(values: Vec<Option<f64>>) -> f64 {
    let present: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if present.is_empty() {
        return 0.0;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    mean.clamp(0.0, 100.0)
}

/// Overall score of a dimension: rounded mean of its sub-dimension scores.
pub async fn dimension_score(
    access: &DataAccess,
    dimension: &str,
    territory: &str,
    period: i32,
) -> Outcome<i64> {
    subdimension_scores(access, dimension, territory, period)
        .await
        .map(|scores| {
            if scores.is_empty() {
                return 0;
            }
            let mean = scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64;
            mean.round() as i64
        })
}

/// Indicator count and rounded share per sub-dimension of `dimension`.
pub async fn indicator_distribution(
    access: &DataAccess,
    dimension: &str,
) -> Outcome<Vec<DistributionEntry>> {
    let (subdimensions, definitions) =
        futures::join!(access.subdimensions_of(dimension), access.indicators());

    let mut outcome = Outcome::ok(());
    let subdimensions = outcome.absorb(subdimensions);
    let definitions = outcome.absorb(definitions);

    let mut per_subdimension: HashMap<&str, usize> = HashMap::new();
    for definition in &definitions {
        *per_subdimension
            .entry(definition.subdimension_name.as_str())
            .or_default() += 1;
    }

    let counts: Vec<(String, usize)> = subdimensions
        .into_iter()
        .map(|s| {
            let count = per_subdimension.get(s.name.as_str()).copied().unwrap_or(0);
            (s.name, count)
        })
        .collect();
    let total: usize = counts.iter().map(|(_, c)| c).sum();

    let entries = counts
        .into_iter()
        .map(|(name, indicator_count)| DistributionEntry {
            name,
            indicator_count,
            percentage: if total > 0 {
                ((indicator_count as f64 / total as f64) * 100.0).round() as i64
            } else {
                0
            },
        })
        .collect();

    outcome.map(|_| entries)
}

/// Per sub-dimension of `dimension`: indicators defined, and how many of them
/// have at least one result for `territory`.
pub async fn subdimension_coverage(
    access: &DataAccess,
    dimension: &str,
    territory: &str,
) -> Outcome<Vec<SubdimensionCoverage>> {
    let mut outcome = Outcome::ok(());
    let subdimensions = outcome.absorb(access.subdimensions_of(dimension).await);

    let covered = join_all(
        subdimensions
            .iter()
            .map(|s| coverage_of(access, &s.name, territory)),
    )
    .await;

    let entries: Vec<SubdimensionCoverage> =
        covered.into_iter().map(|o| outcome.absorb(o)).collect();
    outcome.map(|_| entries)
}

async fn coverage_of(
    access: &DataAccess,
    subdimension: &str,
    territory: &str,
) -> Outcome<SubdimensionCoverage> {
    let mut outcome = Outcome::ok(());
    let names = outcome.absorb(access.indicator_names(subdimension).await);
    let counts = join_all(
        names
            .iter()
            .map(|n| access.territory_result_count(n, territory)),
    )
    .await;

    let indicators_with_data = counts
        .into_iter()
        .map(|o| outcome.absorb(o))
        .filter(|c| *c > 0)
        .count();

    outcome.map(|_| SubdimensionCoverage {
        name: subdimension.to_string(),
        total_indicators: names.len(),
        indicators_with_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::memory_store::MemoryStore;
    use crate::shared::diagnostics::testing::RecordingDiagnostics;
    use crate::shared::territory::REGION;
    use contracts::projections::p001_indicator_result::dto::IndicatorResult;
    use std::sync::Arc;

    fn access(store: MemoryStore) -> DataAccess {
        DataAccess::with_tracing(Arc::new(store))
    }

    fn talento() -> MemoryStore {
        MemoryStore::new()
            .dimension("Capital Humano", 0.2)
            .subdimension("Talento", "Capital Humano", 1.0)
            .indicator("A", "Talento", None)
            .indicator("B", "Talento", None)
    }

    async fn only_score(store: MemoryStore, period: i32) -> SubdimensionScore {
        let scores = subdimension_scores(&access(store), "Capital Humano", REGION, period)
            .await
            .into_value();
        assert_eq!(scores.len(), 1);
        scores.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn test_indicator_without_data_is_left_out_of_the_mean() {
        let score = only_score(talento().result("A", REGION, 2024, 80.0), 2024).await;
        assert_eq!(score.score, 80.0);
        assert_eq!(score.indicator_count, 2);
    }

    #[tokio::test]
    async fn test_missing_period_falls_back_to_newest() {
        let store = talento()
            .result("A", REGION, 2020, 10.0)
            .result("A", REGION, 2022, 40.0);
        let score = only_score(store, 2023).await;
        assert_eq!(score.score, 40.0);
    }

    #[tokio::test]
    async fn test_exact_period_wins_over_newest() {
        let store = talento()
            .result("A", REGION, 2023, 20.0)
            .result("A", REGION, 2024, 90.0);
        let score = only_score(store, 2023).await;
        assert_eq!(score.score, 20.0);
    }

    #[tokio::test]
    async fn test_territory_name_variants() {
        let store = talento()
            .result("A", "Comunidad Valenciana", 2024, 30.0)
            .result("B", "CV", 2021, 50.0);
        let score = only_score(store, 2024).await;
        assert_eq!(score.score, 40.0);
    }

    #[tokio::test]
    async fn test_first_variant_with_rows_stops_the_lookup() {
        // "Comunitat Valenciana" has an older row; the 2024 row under a later
        // variant is never reached.
        let store = talento()
            .result("A", REGION, 2019, 10.0)
            .result("A", "Valencia", 2024, 70.0);
        let score = only_score(store, 2024).await;
        assert_eq!(score.score, 10.0);
    }

    #[tokio::test]
    async fn test_no_territory_data_keeps_references() {
        let store = talento()
            .result("A", "España", 2024, 60.0)
            .result("A", "Alemania", 2024, 70.0)
            .result("A", "Francia", 2024, 50.0);
        let score = only_score(store, 2024).await;
        assert_eq!(score.score, 0.0);
        assert_eq!(score.national, 60.0);
        assert_eq!(score.bloc, 60.0);
    }

    #[tokio::test]
    async fn test_national_reference_ignores_variants() {
        let store = talento().result("A", "Spain", 2024, 60.0);
        let score = only_score(store, 2024).await;
        assert_eq!(score.national, 0.0);
    }

    #[tokio::test]
    async fn test_bloc_uses_exact_period_and_null_as_zero() {
        let store = talento()
            .result("A", "Italia", 2024, 40.0)
            .raw_result(IndicatorResult {
                indicator_name: "A".into(),
                territory: "Países Bajos".into(),
                period: Some(2024),
                value: None,
            })
            .result("A", "Alemania", 2023, 99.0)
            .result("B", "Francia", 2022, 99.0);
        let score = only_score(store, 2024).await;
        // A: (40 + 0) / 2; B has no bloc row at 2024
        assert_eq!(score.bloc, 20.0);
    }

    #[tokio::test]
    async fn test_scores_are_clamped() {
        let high = only_score(talento().result("A", REGION, 2024, 150.0), 2024).await;
        assert_eq!(high.score, 100.0);

        let low = only_score(talento().result("A", REGION, 2024, -20.0), 2024).await;
        assert_eq!(low.score, 0.0);
    }

    #[tokio::test]
    async fn test_stored_zero_is_left_out_of_the_mean() {
        let store = talento()
            .result("A", REGION, 2024, 0.0)
            .result("B", REGION, 2024, 50.0)
            .result("A", "España", 2024, 0.0)
            .result("B", "España", 2024, 30.0);
        let score = only_score(store, 2024).await;
        assert_eq!(score.score, 50.0);
        assert_eq!(score.national, 30.0);
    }

    #[tokio::test]
    async fn test_stored_zero_still_stops_the_lookup() {
        // The zero row under the first variant is picked; the later variant
        // is not consulted.
        let store = talento()
            .result("A", REGION, 2024, 0.0)
            .result("A", "Comunidad Valenciana", 2024, 70.0);
        let score = only_score(store, 2024).await;
        assert_eq!(score.score, 0.0);
    }

    #[tokio::test]
    async fn test_stored_zero_counts_in_the_bloc_mean() {
        let store = talento()
            .result("A", "Alemania", 2024, 0.0)
            .result("A", "Francia", 2024, 60.0);
        let score = only_score(store, 2024).await;
        assert_eq!(score.bloc, 30.0);
    }

    #[tokio::test]
    async fn test_subdimension_without_indicators() {
        let store = talento().subdimension("Vacía", "Capital Humano", 2.0);
        let scores = subdimension_scores(&access(store), "Capital Humano", REGION, 2024)
            .await
            .into_value();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[1], SubdimensionScore::empty("Vacía"));
    }

    #[tokio::test]
    async fn test_failed_indicator_does_not_abort_the_rest() {
        let store = talento()
            .result("A", REGION, 2024, 80.0)
            .result("B", REGION, 2024, 20.0)
            .fail_indicator("B");
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let access = DataAccess::new(Arc::new(store), diagnostics.clone());

        let outcome = subdimension_scores(&access, "Capital Humano", REGION, 2024).await;
        assert!(outcome.is_degraded());
        assert_eq!(outcome.value[0].score, 80.0);
        assert!(!diagnostics.failed_operations().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_dimension_is_empty() {
        let scores = subdimension_scores(&access(talento()), "Nada", REGION, 2024).await;
        assert!(scores.value.is_empty());
        assert!(!scores.is_degraded());
        assert_eq!(dimension_score(&access(talento()), "Nada", REGION, 2024).await.value, 0);
    }

    #[tokio::test]
    async fn test_dimension_score_rounds_mean() {
        let store = talento()
            .subdimension("Formación", "Capital Humano", 2.0)
            .indicator("C", "Formación", None)
            .result("A", REGION, 2024, 81.0)
            .result("C", REGION, 2024, 40.0);
        // (81 + 40) / 2 = 60.5
        let score = dimension_score(&access(store), "Capital Humano", REGION, 2024).await;
        assert_eq!(score.value, 61);
    }

    #[tokio::test]
    async fn test_distribution_percentages() {
        let store = talento()
            .subdimension("Formación", "Capital Humano", 2.0)
            .indicator("C", "Formación", None)
            .indicator("Z", "Otra", None);
        let entries = indicator_distribution(&access(store), "Capital Humano")
            .await
            .into_value();
        assert_eq!(
            entries,
            vec![
                DistributionEntry {
                    name: "Talento".into(),
                    indicator_count: 2,
                    percentage: 67
                },
                DistributionEntry {
                    name: "Formación".into(),
                    indicator_count: 1,
                    percentage: 33
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_distribution_need_not_sum_to_100() {
        let store = MemoryStore::new()
            .subdimension("S1", "D", 1.0)
            .subdimension("S2", "D", 2.0)
            .subdimension("S3", "D", 3.0)
            .indicator("a", "S1", None)
            .indicator("b", "S2", None)
            .indicator("c", "S3", None);
        let entries = indicator_distribution(&access(store), "D").await.into_value();
        let percentages: Vec<_> = entries.iter().map(|e| e.percentage).collect();
        assert_eq!(percentages, vec![33, 33, 33]);
    }

    #[tokio::test]
    async fn test_distribution_without_indicators() {
        let store = MemoryStore::new().subdimension("S1", "D", 1.0);
        let entries = indicator_distribution(&access(store), "D").await.into_value();
        assert_eq!(entries[0].percentage, 0);
        assert_eq!(entries[0].indicator_count, 0);
    }

    #[tokio::test]
    async fn test_coverage_counts_indicators_with_rows() {
        let store = talento()
            .indicator("C", "Talento", None)
            .result("A", REGION, 2020, 1.0)
            .result("A", REGION, 2021, 2.0)
            .result("B", "España", 2024, 3.0);
        let coverage = subdimension_coverage(&access(store), "Capital Humano", REGION)
            .await
            .into_value();
        assert_eq!(
            coverage,
            vec![SubdimensionCoverage {
                name: "Talento".into(),
                total_indicators: 3,
                indicators_with_data: 1,
            }]
        );
    }
}
