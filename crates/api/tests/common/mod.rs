#![allow(dead_code)] // each test binary uses its own subset of these helpers

use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use varia_api::config::ServerConfig;
use varia_api::routes;
use varia_api::state::AppState;

/// Boundary used by [`multipart_body`].
pub const MULTIPART_BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Metrics engine stub: emits two progress markers and writes a populated
/// result document into its own directory (the scratch dir).
pub const METRICS_STUB: &str = r#"
echo 'PROGRESS(10|Parsing input)'
echo 'PROGRESS(55|Testing significance)'
dir=$(dirname "$0")
printf '%s' '{"primaryResults":[{"country":"UK","kpiName":"CVR","uplift":12.5,"confidence":97.2},{"country":"FR","kpiName":"CVR","uplift":-3.1,"confidence":41.0}],"insights":{"recommendation":"Rollout"}}' > "$dir/results.json"
"#;

/// Report engine stub: emits one marker and writes both workbooks.
pub const REPORT_STUB: &str = r#"
echo 'PROGRESS(85|Formatting workbook)'
dir=$(dirname "$0")
printf '%s' 'workbook-bytes' > "$dir/report.xlsx"
printf '%s' 'parsed-bytes' > "$dir/parsed_data.xlsx"
"#;

/// Build a test `ServerConfig` rooted in the given scratch directory.
///
/// Engines run through `sh` so tests can stub them with shell scripts, and
/// the generative API points at an unroutable loopback port so any
/// accidental outbound call fails fast.
pub fn test_config(scratch: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        scratch_dir: scratch.to_path_buf(),
        python_bin: Some("sh".to_string()),
        metrics_script: scratch.join("metrics.sh"),
        report_script: scratch.join("report.sh"),
        detect_script: scratch.join("detect.sh"),
        engine_timeout_secs: 30,
        result_poll_attempts: 10,
        result_poll_delay_ms: 20,
        genai_api_key: None,
        genai_base_url: "http://127.0.0.1:9".to_string(),
        genai_model: "gemini-pro".to_string(),
    }
}

/// Write an engine stub script into place.
pub async fn write_script(path: &Path, body: &str) {
    tokio::fs::write(path, body).await.unwrap();
}

/// Install the happy-path metrics and report stubs for `config`.
pub async fn install_success_engines(config: &ServerConfig) {
    write_script(&config.metrics_script, METRICS_STUB).await;
    write_script(&config.report_script, REPORT_STUB).await;
}

/// Build the full application router with all middleware layers.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, gzip,
/// tracing, panic recovery) that production uses.
pub fn build_test_app(config: ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:3000".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(CompressionLayer::new().compress_when(
            DefaultPredicate::new().and(NotForContentType::new("application/x-ndjson")),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(AppState::new(config))
}

/// One part of a multipart form body.
pub enum MultipartPart<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        filename: &'a str,
        bytes: &'a [u8],
    },
}

/// Assemble a `multipart/form-data` body using [`MULTIPART_BOUNDARY`].
pub fn multipart_body(parts: &[MultipartPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        match part {
            MultipartPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            MultipartPart::File {
                name,
                filename,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

/// Send a GET request through the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a multipart POST request through the app.
pub async fn post_multipart(
    app: Router,
    uri: &str,
    parts: &[MultipartPart<'_>],
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a JSON POST request through the app.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect the full response body.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Collect the response body and parse it as one JSON document.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Collect an NDJSON response body and parse each line.
pub async fn ndjson_events(response: Response<Body>) -> Vec<serde_json::Value> {
    let bytes = body_bytes(response).await;
    let text = String::from_utf8(bytes).unwrap();
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).unwrap_or_else(|err| panic!("bad NDJSON line {line:?}: {err}"))
        })
        .collect()
}
