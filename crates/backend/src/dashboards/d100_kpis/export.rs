use anyhow::Result;
use chrono::NaiveDate;
use contracts::dashboards::d100_kpis::dto::IndicatorWithData;

const HEADERS: [&str; 12] = [
    "Indicador",
    "Dimensión",
    "Subdimensión",
    "Último valor",
    "Periodo",
    "Total resultados",
    "Activo",
    "Importancia",
    "Fórmula",
    "Fuente",
    "Origen",
    "Valor normalizado",
];

/// Render the (already filtered) indicator list as CSV text with a header row.
pub fn indicators_to_csv(indicators: &[&IndicatorWithData]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;

    for indicator in indicators {
        let definition = &indicator.definition;
        writer.write_record([
            indicator.name().to_string(),
            indicator.dimension.clone(),
            indicator.subdimension.clone(),
            indicator
                .latest_value
                .map(|v| v.to_string())
                .unwrap_or_default(),
            indicator
                .latest_period
                .map(|p| p.to_string())
                .unwrap_or_default(),
            indicator.total_results.to_string(),
            if indicator.active { "Sí" } else { "No" }.to_string(),
            definition.importance.clone().unwrap_or_default(),
            definition.formula.clone().unwrap_or_default(),
            definition.source.clone().unwrap_or_default(),
            definition.origin.clone().unwrap_or_default(),
            indicator.normalized_value().to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

/// `<base>-YYYY-MM-DD.csv`
pub fn export_file_name(base: &str, date: NaiveDate) -> String {
    format!("{}-{}.csv", base, date.format("%Y-%m-%d"))
}
