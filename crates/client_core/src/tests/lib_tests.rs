use std::sync::{Arc, Mutex as StdMutex};

use super::*;
use axum::{
    extract::{Multipart, Path as AxumPath, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct ReceivedUpload {
    field: String,
    filename: String,
    content_type: Option<String>,
    len: usize,
}

#[derive(Clone, Default)]
struct FakeServiceState {
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    chart_requests: Arc<Mutex<Vec<Value>>>,
    report_requests: Arc<Mutex<Vec<Value>>>,
}

fn stem(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename)
}

async fn handle_upload(
    State(state): State<FakeServiceState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap_or_default();
        if !(filename.ends_with(".csv") || filename.ends_with(".xlsx")) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "message": "Allowed file types are CSV and XLSX."})),
            );
        }
        state.uploads.lock().await.push(ReceivedUpload {
            field: field_name,
            filename: filename.clone(),
            content_type,
            len: data.len(),
        });
        return (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "File uploaded successfully.",
                "filename": filename,
            })),
        );
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "error", "message": "No file part in the request."})),
    )
}

async fn handle_generate_chart(
    State(state): State<FakeServiceState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.chart_requests.lock().await.push(body.clone());
    let kind = body["type"].as_str().unwrap_or_default().to_string();
    let filename = body["filename"].as_str().unwrap_or_default().to_string();
    if filename == "missing.csv" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "error", "message": "Uploaded file not found."})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "chart_url": format!("/static/uploads/{kind}_chart_{}.png", stem(&filename)),
            "chart_filename": format!("{kind}_chart_{}.png", stem(&filename)),
        })),
    )
}

async fn handle_clear() -> Json<Value> {
    Json(json!({"status": "success", "message": "All files and reports have been cleared."}))
}

async fn handle_generate_report(
    State(state): State<FakeServiceState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.report_requests.lock().await.push(body.clone());
    let filename = body["filename"].as_str().unwrap_or_default().to_string();
    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "report_url": format!("/download_report/report_{}.pdf", stem(&filename)),
        })),
    )
}

async fn handle_download_report(AxumPath(filename): AxumPath<String>) -> Vec<u8> {
    format!("%PDF-fake {filename}").into_bytes()
}

async fn spawn_router(app: Router) -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

async fn spawn_chart_server() -> anyhow::Result<(String, FakeServiceState)> {
    let state = FakeServiceState::default();
    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/generate_chart", post(handle_generate_chart))
        .route("/clear", post(handle_clear))
        .route("/generate_report", post(handle_generate_report))
        .route("/download_report/:filename", get(handle_download_report))
        .with_state(state.clone());
    let url = spawn_router(app).await?;
    Ok((url, state))
}

fn collecting_sink() -> (ProgressSink, Arc<StdMutex<Vec<u8>>>) {
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink: ProgressSink = Arc::new(move |pct| sink_seen.lock().expect("lock").push(pct));
    (sink, seen)
}

#[tokio::test]
async fn upload_sends_multipart_file_field_and_reports_progress() {
    let (server_url, state) = spawn_chart_server().await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");
    let (sink, seen) = collecting_sink();

    let outcome = client
        .upload(SelectedFile::new("sales.csv", vec![b'x'; 200 * 1024]), sink)
        .await
        .expect("upload should succeed");

    assert_eq!(outcome.filename, ServerFilename::new("sales.csv"));
    assert_eq!(outcome.message, "File uploaded successfully.");

    let uploads = state.uploads.lock().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, "file");
    assert_eq!(uploads[0].filename, "sales.csv");
    assert_eq!(uploads[0].content_type.as_deref(), Some("text/csv"));
    assert_eq!(uploads[0].len, 200 * 1024);

    let seen = seen.lock().expect("lock").clone();
    assert_eq!(seen.last().copied(), Some(100));
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn upload_error_status_maps_to_http_status_even_with_json_body() {
    let (server_url, state) = spawn_chart_server().await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");
    let (sink, _) = collecting_sink();

    let err = client
        .upload(SelectedFile::new("notes.txt", b"hello".to_vec()), sink)
        .await
        .expect_err("disallowed extension");

    assert!(matches!(err, ClientError::HttpStatus(400)), "got {err:?}");
    assert!(state.uploads.lock().await.is_empty());
}

#[tokio::test]
async fn generate_chart_posts_type_and_filename() {
    let (server_url, state) = spawn_chart_server().await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");

    let outcome = client
        .generate_chart(ChartKind::Pie, &ServerFilename::new("sales.csv"))
        .await
        .expect("chart");

    assert_eq!(
        outcome.chart_url,
        ChartUrl::new("/static/uploads/pie_chart_sales.png")
    );
    let requests = state.chart_requests.lock().await;
    assert_eq!(requests[0], json!({"type": "pie", "filename": "sales.csv"}));
}

#[tokio::test]
async fn error_envelope_on_error_status_surfaces_service_message() {
    let (server_url, _state) = spawn_chart_server().await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");

    let err = client
        .generate_chart(ChartKind::Bar, &ServerFilename::new("missing.csv"))
        .await
        .expect_err("missing file");

    assert_eq!(err.service_message(), Some("Uploaded file not found."));
}

#[tokio::test]
async fn non_json_error_status_maps_to_http_status() {
    let app = Router::new().route(
        "/clear",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let server_url = spawn_router(app).await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");

    let err = client.clear().await.expect_err("500");
    assert!(matches!(err, ClientError::HttpStatus(500)), "got {err:?}");
}

#[tokio::test]
async fn non_json_success_body_is_a_decode_error() {
    let app = Router::new().route("/clear", post(|| async { "cleared" }));
    let server_url = spawn_router(app).await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");

    let err = client.clear().await.expect_err("not json");
    assert!(matches!(err, ClientError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn clear_returns_service_message() {
    let (server_url, _state) = spawn_chart_server().await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");

    let message = client.clear().await.expect("clear");
    assert_eq!(message, "All files and reports have been cleared.");
}

#[tokio::test]
async fn report_round_trip_fetches_downloadable_bytes() {
    let (server_url, state) = spawn_chart_server().await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");
    let charts = vec![
        ChartUrl::new("/static/uploads/bar_chart_sales.png"),
        ChartUrl::new("/static/uploads/line_chart_sales.png"),
    ];

    let report_url = client
        .generate_report(&ServerFilename::new("sales.csv"), &charts)
        .await
        .expect("report");
    assert_eq!(report_url.as_str(), "/download_report/report_sales.pdf");
    assert_eq!(
        state.report_requests.lock().await[0]["charts"],
        json!([
            "/static/uploads/bar_chart_sales.png",
            "/static/uploads/line_chart_sales.png"
        ])
    );

    let bytes = client.fetch(report_url.as_str()).await.expect("download");
    assert!(bytes.starts_with(b"%PDF-fake report_sales.pdf"));
}

#[tokio::test]
async fn fetch_of_missing_asset_maps_to_http_status() {
    let (server_url, _state) = spawn_chart_server().await.expect("spawn server");
    let client = ChartServiceClient::new(&server_url).expect("client");

    let err = client
        .fetch("/static/uploads/nope.png")
        .await
        .expect_err("404");
    assert!(matches!(err, ClientError::HttpStatus(404)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = ChartServiceClient::new(&format!("http://{addr}")).expect("client");
    let err = client.clear().await.expect_err("nothing listening");
    assert!(err.is_transport(), "got {err:?}");
}

#[test]
fn endpoints_keep_base_path_while_server_references_resolve_from_origin() {
    let client = ChartServiceClient::new("http://127.0.0.1:5000/app").expect("client");

    assert_eq!(
        client.endpoint(UPLOAD_PATH).expect("endpoint").as_str(),
        "http://127.0.0.1:5000/app/upload"
    );
    assert_eq!(
        client
            .resolve("/static/uploads/bar_chart_sales.png")
            .expect("resolve")
            .as_str(),
        "http://127.0.0.1:5000/static/uploads/bar_chart_sales.png"
    );
    assert_eq!(
        client
            .resolve("https://cdn.example.com/chart.png")
            .expect("absolute")
            .as_str(),
        "https://cdn.example.com/chart.png"
    );
}

#[test]
fn report_file_name_takes_last_path_segment() {
    assert_eq!(
        report_file_name("/download_report/report_sales.pdf"),
        "report_sales.pdf"
    );
    assert_eq!(
        report_file_name("http://host/download_report/r.pdf?dl=1#top"),
        "r.pdf"
    );
    assert_eq!(report_file_name("/download_report/"), "report.pdf");
    assert_eq!(report_file_name(""), "report.pdf");
}

#[test]
fn rejects_unparseable_server_url() {
    let err = ChartServiceClient::new("not a url").expect_err("invalid");
    assert!(matches!(err, ClientError::InvalidUrl { .. }));
}

#[tokio::test]
async fn selected_file_load_uses_file_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("quarterly.xlsx");
    std::fs::write(&path, b"PK\x03\x04").expect("write");

    let file = SelectedFile::load(&path).await.expect("load");
    assert_eq!(file.name, "quarterly.xlsx");
    assert_eq!(file.bytes, b"PK\x03\x04".to_vec());
}
