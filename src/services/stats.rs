use polars::prelude::*;

use crate::error::AppError;
use crate::models::{
    AnalysisResult, ColumnStats, CorrelationMatrix, DescriptiveStats, GrowthTrend, GrowthTrends,
};

/// Runs all three analyses over the numeric columns of the table.
pub fn analyze(df: &DataFrame) -> Result<AnalysisResult, AppError> {
    let columns = numeric_columns(df)?;
    if columns.is_empty() {
        return Err(AppError::Analysis(
            "No numeric columns to analyze".to_string(),
        ));
    }

    Ok(AnalysisResult {
        descriptive: describe(&columns),
        correlation: correlation_matrix(&columns),
        growth: growth_trends(&columns),
    })
}

/// Extracts every numeric column as row-aligned optional values; other
/// columns are skipped.
pub fn numeric_columns(df: &DataFrame) -> Result<Vec<(String, Vec<Option<f64>>)>, AppError> {
    let mut out = Vec::new();
    for series in df.get_columns() {
        if !series.dtype().is_numeric() {
            continue;
        }
        let casted = series.cast(&DataType::Float64).map_err(|e| {
            AppError::Analysis(format!("Failed to read column {}: {}", series.name(), e))
        })?;
        let values = casted
            .f64()
            .map_err(|e| AppError::Analysis(e.to_string()))?
            .into_iter()
            .collect();
        out.push((series.name().to_string(), values));
    }
    Ok(out)
}

fn describe(columns: &[(String, Vec<Option<f64>>)]) -> DescriptiveStats {
    DescriptiveStats {
        columns: columns
            .iter()
            .map(|(name, values)| column_stats(name, values))
            .collect(),
    }
}

fn column_stats(name: &str, values: &[Option<f64>]) -> ColumnStats {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(|a, b| a.total_cmp(b));

    let count = present.len();
    let mean = if count == 0 {
        f64::NAN
    } else {
        present.iter().sum::<f64>() / count as f64
    };

    ColumnStats {
        name: name.to_string(),
        count,
        mean,
        std: sample_std(&present, mean),
        min: present.first().copied().unwrap_or(f64::NAN),
        q1: quantile(&present, 0.25),
        median: quantile(&present, 0.5),
        q3: quantile(&present, 0.75),
        max: present.last().copied().unwrap_or(f64::NAN),
    }
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Quantile of a sorted slice with linear interpolation between ranks.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

fn correlation_matrix(columns: &[(String, Vec<Option<f64>>)]) -> CorrelationMatrix {
    let n = columns.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&columns[i].1, &columns[j].1);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        labels: columns.iter().map(|(name, _)| name.clone()).collect(),
        values,
    }
}

/// Pearson coefficient over rows where both values are present. NaN when
/// fewer than two complete pairs exist or either column is constant.
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some((*x, *y)),
            _ => None,
        })
        .collect();

    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        sxy / denom
    }
}

fn growth_trends(columns: &[(String, Vec<Option<f64>>)]) -> GrowthTrends {
    GrowthTrends {
        entries: columns
            .iter()
            .map(|(name, values)| GrowthTrend {
                name: name.clone(),
                rate: mean_pct_change(values),
            })
            .collect(),
    }
}

/// Mean of (v[i] - v[i-1]) / v[i-1] over consecutive present pairs. A zero
/// predecessor yields inf or NaN and the non-finite mean is kept as-is.
fn mean_pct_change(values: &[Option<f64>]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for pair in values.windows(2) {
        if let (Some(prev), Some(cur)) = (pair[0], pair[1]) {
            sum += (cur - prev) / prev;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("alpha", vec![1.0f64, 2.0, 3.0]),
            Series::new("beta", vec![10.0f64, 20.0, 30.0]),
        ])
        .unwrap()
    }

    #[test]
    fn count_equals_row_count_for_numeric_table() {
        let analysis = analyze(&numeric_frame()).unwrap();

        for column in &analysis.descriptive.columns {
            assert_eq!(column.count, 3);
        }
    }

    #[test]
    fn descriptive_stats_match_closed_forms() {
        let analysis = analyze(&numeric_frame()).unwrap();
        let alpha = &analysis.descriptive.columns[0];

        assert_eq!(alpha.mean, 2.0);
        assert!((alpha.std - 1.0).abs() < 1e-12);
        assert_eq!(alpha.min, 1.0);
        assert_eq!(alpha.q1, 1.5);
        assert_eq!(alpha.median, 2.0);
        assert_eq!(alpha.q3, 2.5);
        assert_eq!(alpha.max, 3.0);
    }

    #[test]
    fn quartiles_interpolate_linearly() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.25), 1.75);
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
        assert_eq!(quantile(&[5.0], 0.75), 5.0);
        assert!(quantile(&[], 0.5).is_nan());
    }

    #[test]
    fn self_correlation_is_exactly_one() {
        let analysis = analyze(&numeric_frame()).unwrap();

        assert_eq!(analysis.correlation.values[0][0], 1.0);
        assert_eq!(analysis.correlation.values[1][1], 1.0);
    }

    #[test]
    fn anticorrelated_columns_hit_minus_one() {
        let df = DataFrame::new(vec![
            Series::new("up", vec![1.0f64, 2.0, 3.0]),
            Series::new("down", vec![3.0f64, 2.0, 1.0]),
        ])
        .unwrap();
        let analysis = analyze(&df).unwrap();

        assert!((analysis.correlation.values[0][1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_correlates_as_nan() {
        let df = DataFrame::new(vec![
            Series::new("flat", vec![5.0f64, 5.0, 5.0]),
            Series::new("up", vec![1.0f64, 2.0, 3.0]),
        ])
        .unwrap();
        let analysis = analyze(&df).unwrap();

        assert!(analysis.correlation.values[0][1].is_nan());
    }

    #[test]
    fn non_numeric_columns_are_excluded() {
        let df = DataFrame::new(vec![
            Series::new("label", vec!["a", "b", "c"]),
            Series::new("value", vec![1.0f64, 2.0, 3.0]),
        ])
        .unwrap();
        let analysis = analyze(&df).unwrap();

        assert_eq!(analysis.correlation.labels, vec!["value"]);
        assert_eq!(analysis.descriptive.columns.len(), 1);
    }

    #[test]
    fn growth_trend_is_mean_fractional_change() {
        let analysis = analyze(&numeric_frame()).unwrap();

        // alpha: (2-1)/1 = 1.0, (3-2)/2 = 0.5 -> mean 0.75
        assert!((analysis.growth.entries[0].rate - 0.75).abs() < 1e-12);
        assert!((analysis.growth.entries[1].rate - 0.75).abs() < 1e-12);
    }

    #[test]
    fn zero_predecessor_produces_non_finite_trend() {
        let df = DataFrame::new(vec![Series::new("spiky", vec![0.0f64, 5.0, 10.0])]).unwrap();
        let analysis = analyze(&df).unwrap();

        assert!(!analysis.growth.entries[0].rate.is_finite());
    }

    #[test]
    fn table_without_numeric_columns_is_an_error() {
        let df = DataFrame::new(vec![Series::new("label", vec!["a", "b"])]).unwrap();

        assert!(matches!(analyze(&df), Err(AppError::Analysis(_))));
    }
}
