use std::collections::HashSet;
use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use polars::prelude::*;

use crate::error::AppError;

/// Parses the first worksheet of an XLSX payload into a DataFrame. The
/// first row becomes the header; when `drop_name_columns` is set the first
/// two columns are removed before anything downstream sees the table.
pub fn load_table(file_data: Bytes, drop_name_columns: bool) -> Result<DataFrame, AppError> {
    let cursor = Cursor::new(file_data);

    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
        .map_err(|e| AppError::Spreadsheet(format!("Failed to open spreadsheet: {}", e)))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::Spreadsheet("No sheets found in workbook".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        AppError::Spreadsheet(format!("Failed to read worksheet {}: {}", sheet_name, e))
    })?;

    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    if rows.is_empty() {
        return Err(AppError::Spreadsheet(format!("Sheet {} is empty", sheet_name)));
    }

    let mut existing_names = HashSet::new();
    let headers: Vec<String> = rows[0]
        .iter()
        .map(|cell| clean_column_name(&cell.to_string(), &mut existing_names))
        .collect();

    tracing::info!(
        "Parsed sheet {} with {} data rows, {} columns",
        sheet_name,
        rows.len() - 1,
        headers.len()
    );

    let df = build_dataframe(&rows, &headers)?;
    if drop_name_columns {
        drop_leading_columns(&df, 2)
    } else {
        Ok(df)
    }
}

fn build_dataframe(rows: &[Vec<Data>], headers: &[String]) -> Result<DataFrame, AppError> {
    if headers.is_empty() {
        return Err(AppError::Spreadsheet("Header row is empty".to_string()));
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let values: Vec<Data> = rows
            .iter()
            .skip(1) // Skip header row
            .map(|row| row.get(col_idx).cloned().unwrap_or(Data::Empty))
            .collect();

        let series = if column_is_numeric(&values) {
            let nums: Vec<Option<f64>> = values
                .iter()
                .map(|v| match v {
                    Data::Float(x) => Some(*x),
                    Data::Int(i) => Some(*i as f64),
                    _ => None,
                })
                .collect();
            Series::new(header.as_str(), nums)
        } else {
            let strings: Vec<String> = values
                .iter()
                .map(|v| match v {
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect();
            Series::new(header.as_str(), strings)
        };

        columns.push(series);
    }

    DataFrame::new(columns)
        .map_err(|e| AppError::Spreadsheet(format!("Failed to build table: {}", e)))
}

/// A column counts as numeric when every non-empty cell is a number and at
/// least one number is present. Empty cells become nulls.
fn column_is_numeric(values: &[Data]) -> bool {
    let mut saw_number = false;
    for value in values {
        match value {
            Data::Float(_) | Data::Int(_) => saw_number = true,
            Data::Empty => {}
            _ => return false,
        }
    }
    saw_number
}

/// Positional slice mirroring `iloc[:, n:]`: a table with `n` or fewer
/// columns degenerates to an empty frame rather than failing.
fn drop_leading_columns(df: &DataFrame, n: usize) -> Result<DataFrame, AppError> {
    let names = df.get_column_names();
    if names.len() <= n {
        return Ok(DataFrame::empty());
    }
    df.select(names[n..].iter().copied())
        .map_err(|e| AppError::Spreadsheet(format!("Failed to slice columns: {}", e)))
}

fn clean_column_name(name: &str, existing_names: &mut HashSet<String>) -> String {
    let base_name = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>()
        .to_lowercase();

    let mut cleaned = if base_name.chars().next().map_or(true, |c| !c.is_alphabetic()) {
        format!("col_{}", base_name)
    } else {
        base_name
    };

    // If the name already exists, add a numeric suffix
    let mut counter = 1;
    let original_name = cleaned.clone();
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", original_name, counter);
        counter += 1;
    }

    cleaned
}
