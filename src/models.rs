use std::fmt;

/// Per-column descriptive statistics. `std` uses the sample (n-1)
/// denominator and is NaN for fewer than two observations; the quartiles
/// are linearly interpolated.
#[derive(Debug, Clone)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptiveStats {
    pub columns: Vec<ColumnStats>,
}

/// Pairwise Pearson correlation over the numeric columns. `values[i][j]`
/// is the coefficient between `labels[i]` and `labels[j]`; the matrix is
/// symmetric with NaN where a coefficient is undefined.
#[derive(Debug, Clone, Default)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// Mean fractional row-to-row change for one column. A zero predecessor
/// makes the rate non-finite and it stays that way all the way into the
/// report.
#[derive(Debug, Clone)]
pub struct GrowthTrend {
    pub name: String,
    pub rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GrowthTrends {
    pub entries: Vec<GrowthTrend>,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub descriptive: DescriptiveStats,
    pub correlation: CorrelationMatrix,
    pub growth: GrowthTrends,
}

const STAT_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn stat_cells(stats: &ColumnStats) -> Vec<String> {
    vec![
        format!("{:.6}", stats.count as f64),
        format!("{:.6}", stats.mean),
        format!("{:.6}", stats.std),
        format!("{:.6}", stats.min),
        format!("{:.6}", stats.q1),
        format!("{:.6}", stats.median),
        format!("{:.6}", stats.q3),
        format!("{:.6}", stats.max),
    ]
}

impl fmt::Display for DescriptiveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self.columns.iter().map(stat_cells).collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, vals)| {
                vals.iter()
                    .map(|v| v.len())
                    .chain([c.name.len()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:<5}", "")?;
        for (column, width) in self.columns.iter().zip(widths.iter().copied()) {
            write!(f, "  {:>width$}", column.name)?;
        }
        for (row_idx, row_label) in STAT_ROWS.iter().enumerate() {
            write!(f, "\n{:<5}", row_label)?;
            for (vals, width) in cells.iter().zip(widths.iter().copied()) {
                write!(f, "  {:>width$}", vals[row_idx])?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .values
            .iter()
            .map(|row| row.iter().map(|v| format!("{:.6}", v)).collect())
            .collect();
        let label_width = self.labels.iter().map(|l| l.len()).max().unwrap_or(0);
        let widths: Vec<usize> = self
            .labels
            .iter()
            .enumerate()
            .map(|(col, label)| {
                cells
                    .iter()
                    .map(|row| row[col].len())
                    .chain([label.len()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:<label_width$}", "")?;
        for (label, width) in self.labels.iter().zip(widths.iter().copied()) {
            write!(f, "  {:>width$}", label)?;
        }
        for (row_idx, label) in self.labels.iter().enumerate() {
            write!(f, "\n{:<label_width$}", label)?;
            for (col_idx, width) in widths.iter().copied().enumerate() {
                write!(f, "  {:>width$}", cells[row_idx][col_idx])?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for GrowthTrends {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .entries
            .iter()
            .map(|e| e.name.len())
            .max()
            .unwrap_or(0);
        for (idx, entry) in self.entries.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{:<name_width$}  {:.6}", entry.name, entry.rate)?;
        }
        Ok(())
    }
}
