use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, Method},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    config::{BAR_CHART_FILE, PIE_CHART_FILE, REPORT_FILE, TREND_CHART_FILE},
    error::AppError,
    services::{charts, report, stats, table_loader},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/", get(home))
        .route("/upload", post(upload))
        .route("/download/pie_chart", get(download_pie_chart))
        .route("/download/bar_chart", get(download_bar_chart))
        .route("/download/trend_chart", get(download_trend_chart))
        .route("/download/:filename", get(download_artifact))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
struct HomeQuery {
    message: Option<String>,
}

async fn home(Query(query): Query<HomeQuery>) -> Html<String> {
    let flash = query
        .message
        .map(|m| format!("<p class=\"flash\">{}</p>", escape_html(&m)))
        .unwrap_or_default();

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>InsightGenie</title></head>
<body>
<h1>InsightGenie</h1>
{flash}
<form action="/upload" method="post" enctype="multipart/form-data">
  <p><label>Spreadsheet: <input type="file" name="file"></label></p>
  <p><label>First two columns are names?
    <select name="columns_as_names">
      <option value="no" selected>no</option>
      <option value="yes">yes</option>
    </select>
  </label></p>
  <p><button type="submit">Analyze</button></p>
</form>
</body>
</html>
"#
    ))
}

#[axum::debug_handler]
async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let start = std::time::Instant::now();

    let mut file_name: Option<String> = None;
    let mut file_data: Option<Bytes> = None;
    let mut columns_as_names = String::from("no");

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some("file") => {
                file_name = field.file_name().map(ToOwned::to_owned);
                file_data = Some(field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read upload: {}", e))
                })?);
            }
            Some("columns_as_names") => {
                columns_as_names = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read form field: {}", e))
                })?;
            }
            _ => {}
        }
    }

    let (file_name, file_data) = match (file_name, file_data) {
        (Some(name), Some(data)) if !name.is_empty() && !data.is_empty() => (name, data),
        _ => {
            tracing::warn!("Upload rejected: no file selected");
            return Ok(Redirect::to("/?message=No%20file%20selected").into_response());
        }
    };

    // Persist the raw upload; these accumulate and are never cleaned.
    let stored_name = sanitize_filename(&file_name);
    let upload_path = state.config.upload_dir.join(&stored_name);
    tokio::fs::write(&upload_path, &file_data).await?;
    tracing::info!(
        "Stored upload {} ({}KB)",
        upload_path.display(),
        file_data.len() / 1024
    );

    let drop_name_columns = columns_as_names.eq_ignore_ascii_case("yes");
    let load_start = std::time::Instant::now();
    let df = table_loader::load_table(file_data, drop_name_columns)?;
    tracing::info!(
        "Loaded table with {} rows, {} columns in {:?}",
        df.height(),
        df.width(),
        load_start.elapsed()
    );

    let analysis_start = std::time::Instant::now();
    let analysis = stats::analyze(&df)?;
    tracing::info!("Statistics computed in {:?}", analysis_start.elapsed());

    let chart_start = std::time::Instant::now();
    let report_dir = &state.config.report_dir;
    charts::render_pie_chart(&df, &report_dir.join(PIE_CHART_FILE))?;
    charts::render_bar_chart(&df, &report_dir.join(BAR_CHART_FILE))?;
    charts::render_trend_chart(&df, &report_dir.join(TREND_CHART_FILE))?;
    tracing::info!("Charts rendered in {:?}", chart_start.elapsed());

    report::write_report(&analysis, &report_dir.join(REPORT_FILE)).await?;
    tracing::info!("Report written, total processing took {:?}", start.elapsed());

    Ok(Html(preview_page()).into_response())
}

fn preview_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>InsightGenie Report</title></head>
<body>
<h1>Analysis complete</h1>
<ul>
  <li><a href="/download/{report}">{report}</a></li>
  <li><a href="/download/{pie}">{pie}</a></li>
  <li><a href="/download/{bar}">{bar}</a></li>
  <li><a href="/download/{trend}">{trend}</a></li>
</ul>
<h2>Charts</h2>
<p><img src="/download/{pie}" alt="Pie chart" width="400"></p>
<p><img src="/download/{bar}" alt="Bar chart" width="500"></p>
<p><img src="/download/{trend}" alt="Trend chart" width="600"></p>
<p><a href="/">Analyze another spreadsheet</a></p>
</body>
</html>
"#,
        report = REPORT_FILE,
        pie = PIE_CHART_FILE,
        bar = BAR_CHART_FILE,
        trend = TREND_CHART_FILE,
    )
}

async fn download_artifact(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    serve_attachment(&state, &filename).await
}

async fn download_pie_chart(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    serve_attachment(&state, PIE_CHART_FILE).await
}

async fn download_bar_chart(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    serve_attachment(&state, BAR_CHART_FILE).await
}

async fn download_trend_chart(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    serve_attachment(&state, TREND_CHART_FILE).await
}

async fn serve_attachment(state: &AppState, filename: &str) -> Result<Response, AppError> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::InvalidInput("Invalid filename".to_string()));
    }

    let path = state.config.report_dir.join(filename);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!(
                "No such report file: {}",
                filename
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = if filename.ends_with(".png") {
        "image/png"
    } else {
        "text/plain; charset=utf-8"
    };
    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((headers, data).into_response())
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "upload.xlsx".to_string()
    } else {
        cleaned
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
