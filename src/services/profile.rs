use anyhow::{anyhow, Result};
use polars::prelude::*;
use std::collections::HashMap;

use crate::models::dataset::{ColumnKind, Dataset};
use crate::models::response::{ColumnStatistics, DataSummary, DatasetProfile, NumericStatistics};

const FREQUENT_VALUE_LIMIT: usize = 10;

/// Summary statistics + per-column stats + correlations
pub fn profile_dataset(dataset: &Dataset) -> Result<DatasetProfile> {
    let df = dataset.frame();
    let (row_count, col_count) = dataset.shape();

    let numeric_columns = dataset.columns_of_kind(ColumnKind::Numeric);
    let date_columns = dataset.columns_of_kind(ColumnKind::DateLike);
    let categorical_columns = dataset.columns_of_kind(ColumnKind::Text);

    let summary_text = format!(
        "Dataset has {} rows and {} columns ({} numeric, {} categorical, {} date).",
        row_count,
        col_count,
        numeric_columns.len(),
        categorical_columns.len(),
        date_columns.len()
    );
    let data_summary = DataSummary {
        row_count,
        column_count: col_count,
        numeric_columns: numeric_columns.clone(),
        categorical_columns: categorical_columns.clone(),
        date_columns,
        summary_text,
    };

    let mut column_statistics = Vec::with_capacity(col_count);
    for s in df.get_columns() {
        let name = s.name().to_string();
        let mut stats = ColumnStatistics {
            name: name.clone(),
            data_type: format!("{}", s.dtype()),
            null_count: s.null_count(),
            unique_count: s.n_unique().unwrap_or(0),
            ..Default::default()
        };

        if numeric_columns.contains(&name) {
            stats.numeric = numeric_statistics(s)?;
        } else if categorical_columns.contains(&name) {
            stats.frequent_values = Some(frequent_values(s)?);
        }

        column_statistics.push(stats);
    }

    // Pairwise correlations (only if ≥2 numeric columns)
    let correlations = if numeric_columns.len() >= 2 {
        let mut corr_map = HashMap::new();
        for i in 0..numeric_columns.len() {
            for j in (i + 1)..numeric_columns.len() {
                let c1 = &numeric_columns[i];
                let c2 = &numeric_columns[j];
                let s1 = df.column(c1)?.cast(&DataType::Float64)?;
                let s2 = df.column(c2)?.cast(&DataType::Float64)?;
                if let Ok(corr_val) = calculate_correlation(&s1, &s2) {
                    corr_map.insert(format!("{}-{}", c1, c2), corr_val);
                }
            }
        }
        Some(corr_map)
    } else {
        None
    };

    Ok(DatasetProfile {
        data_summary,
        column_statistics,
        correlations,
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// `None` when the column holds no values at all
fn numeric_statistics(s: &Series) -> Result<Option<NumericStatistics>> {
    let cast = s.cast(&DataType::Float64)?;
    let ca = cast.f64()?;

    let (min, max, mean, median) = match (ca.min(), ca.max(), ca.mean(), ca.median()) {
        (Some(min), Some(max), Some(mean), Some(median)) => (min, max, mean, median),
        _ => return Ok(None),
    };
    let quantile = |q: f64| -> Result<f64> {
        let value = ca.quantile(q, QuantileInterpolOptions::Linear)?;
        Ok(round2(value.unwrap_or(median)))
    };

    Ok(Some(NumericStatistics {
        min,
        max,
        mean: round2(mean),
        median: round2(median),
        std_dev: ca.std(1).filter(|v| v.is_finite()).map(round2),
        percentile_25: quantile(0.25)?,
        percentile_75: quantile(0.75)?,
    }))
}

/// Most frequent values, highest count first
fn frequent_values(s: &Series) -> Result<HashMap<String, u32>> {
    let text = s.cast(&DataType::Utf8)?;
    let counts = text
        .value_counts(true, false)?
        .head(Some(FREQUENT_VALUE_LIMIT));

    // counts frame: [ <column name>, "counts" ]
    let values = counts.column(text.name())?.utf8()?;
    let totals = counts.column("counts")?.cast(&DataType::UInt32)?;
    let totals = totals.u32()?;

    let mut frequent = HashMap::new();
    for (value, total) in values.into_iter().zip(totals.into_iter()) {
        if let (Some(value), Some(total)) = (value, total) {
            frequent.insert(value.to_string(), total);
        }
    }
    Ok(frequent)
}

/// Calculate the Pearson correlation coefficient between two Series
/// Both Series should already be cast to Float64 type
fn calculate_correlation(s1: &Series, s2: &Series) -> Result<f64> {
    let ca1 = s1.f64()?;
    let ca2 = s2.f64()?;

    if ca1.len() != ca2.len() {
        return Err(anyhow!("Series must have the same length"));
    }

    // Only pairs where both values are present take part
    let pairs: Vec<(f64, f64)> = ca1
        .into_iter()
        .zip(ca2.into_iter())
        .filter_map(|(v1, v2)| Some((v1?, v2?)))
        .collect();

    if pairs.len() < 2 {
        return Err(anyhow!("Not enough valid data points to compute correlation"));
    }

    let n = pairs.len() as f64;
    let mean1 = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean2 = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov_sum = 0.0;
    let mut var1_sum = 0.0;
    let mut var2_sum = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean1;
        let dy = y - mean2;
        cov_sum += dx * dy;
        var1_sum += dx * dx;
        var2_sum += dy * dy;
    }

    if var1_sum.abs() < f64::EPSILON || var2_sum.abs() < f64::EPSILON {
        return Err(anyhow!("Cannot compute correlation: one or both series have zero variance"));
    }

    Ok((cov_sum / (var1_sum.sqrt() * var2_sum.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        let frame = df!(
            "region" => &["North", "South", "North", "East"],
            "units" => &[1.0, 2.0, 3.0, 4.0],
            "revenue" => &[10.0, 20.0, 30.0, 40.0]
        )
        .unwrap();
        Dataset::new("regions.csv", frame)
    }

    #[test]
    fn buckets_columns_by_kind() {
        let profile = profile_dataset(&dataset()).unwrap();
        assert_eq!(profile.data_summary.numeric_columns, ["units", "revenue"]);
        assert_eq!(profile.data_summary.categorical_columns, ["region"]);
        assert_eq!(profile.column_statistics.len(), 3);
    }

    #[test]
    fn perfectly_linear_columns_correlate() {
        let profile = profile_dataset(&dataset()).unwrap();
        let correlations = profile.correlations.unwrap();
        let value = correlations["units-revenue"];
        assert!((value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn counts_frequent_text_values() {
        let profile = profile_dataset(&dataset()).unwrap();
        let region = profile
            .column_statistics
            .iter()
            .find(|c| c.name == "region")
            .unwrap();
        let frequent = region.frequent_values.as_ref().unwrap();
        assert_eq!(frequent["North"], 2);
        assert_eq!(frequent["East"], 1);
    }

    #[test]
    fn text_columns_carry_no_numeric_fields() {
        let profile = profile_dataset(&dataset()).unwrap();
        let json = serde_json::to_value(&profile.column_statistics).unwrap();

        let region = &json[0];
        assert_eq!(region["name"], "region");
        assert!(region.get("numeric").is_none());
        assert_eq!(region["frequent_values"]["North"], 2);

        let units = &json[1];
        assert!(units.get("frequent_values").is_none());
        assert_eq!(units["numeric"]["min"], 1.0);
        assert_eq!(units["numeric"]["max"], 4.0);
        assert_eq!(units["numeric"]["mean"], 2.5);
        assert_eq!(units["numeric"]["percentile_25"], 1.75);
        assert_eq!(units["numeric"]["std_dev"], 1.29);
    }

    #[test]
    fn empty_numeric_column_has_no_spread() {
        let series = Series::new("amount", &[None::<f64>, None]);
        assert!(numeric_statistics(&series).unwrap().is_none());

        let single = Series::new("amount", &[7.0]);
        let stats = numeric_statistics(&single).unwrap().unwrap();
        assert_eq!(stats.median, 7.0);
        assert_eq!(stats.std_dev, None);
    }

    #[test]
    fn frequent_values_keep_the_top_ten() {
        let mut names: Vec<String> = (0..12).map(|i| format!("item{:02}", i)).collect();
        names.extend(["item00", "item00", "item01"].map(String::from));
        let series = Series::new("item", names);

        let frequent = frequent_values(&series).unwrap();
        assert_eq!(frequent.len(), FREQUENT_VALUE_LIMIT);
        assert_eq!(frequent["item00"], 3);
        assert_eq!(frequent["item01"], 2);
    }

    #[test]
    fn zero_variance_has_no_correlation() {
        let s1 = Series::new("a", &[1.0, 1.0, 1.0]);
        let s2 = Series::new("b", &[1.0, 2.0, 3.0]);
        assert!(calculate_correlation(&s1, &s2).is_err());
    }
}
