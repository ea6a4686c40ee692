use std::collections::HashMap;
use std::path::Path;

use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::FontTransform;
use polars::prelude::*;

use crate::error::AppError;
use crate::services::stats;

/// Fixed palette shared by all three charts.
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

fn palette_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Pie chart of the first column's value distribution, slice labels
/// carrying percentages to one decimal place.
pub fn render_pie_chart(df: &DataFrame, path: &Path) -> Result<(), AppError> {
    let counts = first_column_counts(df)?;
    let total: usize = counts.iter().map(|(_, c)| *c).sum();
    if total == 0 {
        return Err(AppError::Chart("First column has no values".to_string()));
    }

    let sizes: Vec<f64> = counts.iter().map(|(_, c)| *c as f64).collect();
    let labels: Vec<String> = counts
        .iter()
        .map(|(value, count)| {
            format!("{} ({:.1}%)", value, 100.0 * *count as f64 / total as f64)
        })
        .collect();
    let colors: Vec<RGBColor> = (0..counts.len()).map(palette_color).collect();

    let root = BitMapBackend::new(path, (800, 800)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| AppError::Chart(e.to_string()))?;
    let root = root
        .titled(
            "Distribution of First Column Values",
            ("sans-serif", 28).into_font(),
        )
        .map_err(|e| AppError::Chart(e.to_string()))?;

    let center = (400, 400);
    let radius = 280.0;
    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style(("sans-serif", 16).into_font());
    root.draw(&pie).map_err(|e| AppError::Chart(e.to_string()))?;

    root.present().map_err(|e| AppError::Chart(e.to_string()))?;
    Ok(())
}

/// Bar chart of per-column sums, sorted descending, with the value axis
/// inverted so the largest bar meets the top of the plot.
pub fn render_bar_chart(df: &DataFrame, path: &Path) -> Result<(), AppError> {
    let columns = stats::numeric_columns(df)?;
    if columns.is_empty() {
        return Err(AppError::Chart("No numeric columns to chart".to_string()));
    }

    let mut sums: Vec<(String, f64)> = columns
        .iter()
        .map(|(name, values)| (name.clone(), values.iter().flatten().sum()))
        .collect();
    sums.sort_by(|a, b| b.1.total_cmp(&a.1));

    let top = sums.iter().map(|s| s.1).fold(f64::NEG_INFINITY, f64::max);
    let y_max = if top <= 0.0 { 1.0 } else { top * 1.1 };
    let labels: Vec<String> = sums.iter().map(|s| s.0.clone()).collect();

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| AppError::Chart(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Sum of Each Column", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(90)
        .y_label_area_size(70)
        // Reversed value range inverts the axis.
        .build_cartesian_2d(0f64..sums.len() as f64, y_max..0f64)
        .map_err(|e| AppError::Chart(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(sums.len())
        .x_label_formatter(&|x| {
            labels
                .get(x.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .x_label_style(("sans-serif", 14).into_font().transform(FontTransform::Rotate90))
        .y_desc("Sum of Values")
        .draw()
        .map_err(|e| AppError::Chart(e.to_string()))?;

    chart
        .draw_series(sums.iter().enumerate().map(|(i, (_, sum))| {
            Rectangle::new(
                [(i as f64 + 0.1, 0.0), (i as f64 + 0.9, *sum)],
                palette_color(i).filled(),
            )
        }))
        .map_err(|e| AppError::Chart(e.to_string()))?;

    root.present().map_err(|e| AppError::Chart(e.to_string()))?;
    Ok(())
}

/// Every numeric column plotted as a line series over row index, with
/// point markers and a legend.
pub fn render_trend_chart(df: &DataFrame, path: &Path) -> Result<(), AppError> {
    let columns = stats::numeric_columns(df)?;
    if columns.is_empty() {
        return Err(AppError::Chart("No numeric columns to chart".to_string()));
    }

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (_, values) in &columns {
        for v in values.iter().flatten() {
            if v.is_finite() {
                y_min = y_min.min(*v);
                y_max = y_max.max(*v);
            }
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return Err(AppError::Chart("No finite values to plot".to_string()));
    }
    if y_min == y_max {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = (y_max - y_min) * 0.05;
    let x_max = (df.height().max(2) - 1) as f64;

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| AppError::Chart(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Trend Analysis Over Time", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, (y_min - pad)..(y_max + pad))
        .map_err(|e| AppError::Chart(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Index")
        .y_desc("Values")
        .draw()
        .map_err(|e| AppError::Chart(e.to_string()))?;

    for (idx, (name, values)) in columns.iter().enumerate() {
        let color = palette_color(idx);
        let points: Vec<(f64, f64)> = values
            .iter()
            .copied()
            .enumerate()
            .filter_map(|(row, v)| v.map(|v| (row as f64, v)))
            .collect();

        chart
            .draw_series(LineSeries::new(points, ShapeStyle::from(&color).stroke_width(2)).point_size(3))
            .map_err(|e| AppError::Chart(e.to_string()))?
            .label(name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| AppError::Chart(e.to_string()))?;

    root.present().map_err(|e| AppError::Chart(e.to_string()))?;
    Ok(())
}

/// Frequency of the first column's distinct values, most frequent first.
/// Numeric values render without a trailing `.0` so category labels stay
/// readable.
fn first_column_counts(df: &DataFrame) -> Result<Vec<(String, usize)>, AppError> {
    let series = df
        .get_columns()
        .first()
        .ok_or_else(|| AppError::Chart("Table has no columns".to_string()))?;

    let rendered: Vec<String> = match series.dtype() {
        DataType::String => series
            .str()
            .map_err(|e| AppError::Chart(e.to_string()))?
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .collect(),
        _ => {
            let casted = series
                .cast(&DataType::Float64)
                .map_err(|e| AppError::Chart(e.to_string()))?;
            casted
                .f64()
                .map_err(|e| AppError::Chart(e.to_string()))?
                .into_iter()
                .flatten()
                .map(format_category)
                .collect()
        }
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in rendered {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

fn format_category(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
