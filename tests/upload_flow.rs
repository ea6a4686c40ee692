use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use insightgenie::{app, config::Config, AppState};

const BOUNDARY: &str = "x-insightgenie-test-boundary";

fn test_app(dir: &Path) -> axum::Router {
    let config = Config {
        upload_dir: dir.join("uploads"),
        report_dir: dir.join("reports"),
        max_file_size: 10 * 1024 * 1024,
    };
    std::fs::create_dir_all(&config.upload_dir).unwrap();
    std::fs::create_dir_all(&config.report_dir).unwrap();
    app(Arc::new(AppState::new(config)))
}

fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(format!(
        "{}/tests/fixtures/{}",
        env!("CARGO_MANIFEST_DIR"),
        name
    ))
    .unwrap()
}

fn multipart_body(file: Option<(&str, &[u8])>, columns_as_names: &str) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"columns_as_names\"\r\n\r\n\
             {columns_as_names}\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

fn upload_request(file: Option<(&str, &[u8])>, columns_as_names: &str) -> Request<Body> {
    let (content_type, body) = multipart_body(file, columns_as_names);
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn upload_produces_report_and_charts() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let workbook = fixture("numeric.xlsx");

    let response = app
        .clone()
        .oneshot(upload_request(Some(("numeric.xlsx", &workbook)), "no"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    for artifact in [
        "report.txt",
        "pie_chart.png",
        "bar_chart.png",
        "trend_analysis.png",
    ] {
        assert!(page.contains(artifact), "preview missing {artifact}");
    }

    let report = std::fs::read_to_string(dir.path().join("reports/report.txt")).unwrap();
    assert!(report.contains("InsightGenie Analysis Report"));
    assert!(report.contains("The average growth rate for 'alpha' is 75.00%."));
    // alpha and beta are perfectly correlated; both orderings are reported
    assert!(report.contains("between 'alpha' and 'beta'"));
    assert!(report.contains("between 'beta' and 'alpha'"));

    for chart in ["pie_chart.png", "bar_chart.png", "trend_analysis.png"] {
        let data = std::fs::read(dir.path().join("reports").join(chart)).unwrap();
        assert_eq!(&data[1..4], b"PNG", "{chart} is not a PNG");
    }

    // the raw upload is kept around
    assert!(dir.path().join("uploads/numeric.xlsx").exists());
}

#[tokio::test]
async fn download_routes_serve_attachments() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let workbook = fixture("numeric.xlsx");

    let response = app
        .clone()
        .oneshot(upload_request(Some(("numeric.xlsx", &workbook)), "no"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/download/report.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(body_string(response).await.contains("InsightGenie Analysis Report"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/download/pie_chart")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
}

#[tokio::test]
async fn missing_file_redirects_with_flash_message() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(upload_request(None, "no"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/?message=No%20file%20selected"
    );
}

#[tokio::test]
async fn home_page_shows_form_and_flash() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    assert!(page.contains("<form action=\"/upload\""));
    assert!(page.contains("columns_as_names"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/?message=No%20file%20selected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(body_string(response).await.contains("No file selected"));
}

#[tokio::test]
async fn name_columns_are_dropped_before_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());
    let workbook = fixture("names.xlsx");

    let response = app
        .clone()
        .oneshot(upload_request(Some(("names.xlsx", &workbook)), "yes"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report = std::fs::read_to_string(dir.path().join("reports/report.txt")).unwrap();
    assert!(report.contains("For column 'units':"));
    assert!(report.contains("For column 'revenue':"));
    assert!(!report.contains("For column 'id':"));
    // units: (5-4)/4 = 0.25, (6-5)/5 = 0.2 -> mean 22.50%
    assert!(report.contains("The average growth rate for 'units' is 22.50%."));
}

#[tokio::test]
async fn unknown_artifact_is_a_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/missing.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn corrupt_spreadsheet_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(upload_request(Some(("junk.xlsx", b"not a workbook")), "no"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("error"));
}

#[tokio::test]
async fn health_check_responds() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(dir.path());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
