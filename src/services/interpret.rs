use crate::models::{CorrelationMatrix, DescriptiveStats, GrowthTrends};

/// One paragraph per column: mean and standard deviation to two decimals,
/// raw min and max.
pub fn descriptive_interpretation(stats: &DescriptiveStats) -> String {
    let mut out = String::new();
    for column in &stats.columns {
        out.push_str(&format!("For column '{}':\n", column.name));
        out.push_str(&format!("- Mean: {:.2}\n", column.mean));
        out.push_str(&format!("- Standard Deviation: {:.2}\n", column.std));
        out.push_str(&format!("- Minimum: {}\n", column.min));
        out.push_str(&format!("- Maximum: {}\n\n", column.max));
    }
    out
}

/// One sentence per cell with |r| strictly above 0.5, walked column-major
/// over the full matrix. A qualifying pair therefore shows up once per
/// ordering and the diagonal qualifies too; that duplication is kept
/// deliberately.
pub fn correlation_interpretation(matrix: &CorrelationMatrix) -> String {
    let mut out = String::from("Correlation Matrix Interpretation:\n");
    for (col_idx, col) in matrix.labels.iter().enumerate() {
        for (row_idx, row) in matrix.labels.iter().enumerate() {
            let r = matrix.values[row_idx][col_idx];
            if r.abs() > 0.5 {
                out.push_str(&format!(
                    "There is a significant correlation of {:.2} between '{}' and '{}'.\n",
                    r, col, row
                ));
            }
        }
    }
    out
}

/// One sentence per column, rate as a percentage with two decimal places.
pub fn growth_interpretation(trends: &GrowthTrends) -> String {
    let mut out = String::from("Growth Trends Interpretation:\n");
    for entry in &trends.entries {
        out.push_str(&format!(
            "The average growth rate for '{}' is {:.2}%.\n",
            entry.name,
            entry.rate * 100.0
        ));
    }
    out
}
