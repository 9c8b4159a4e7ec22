//! HTTP integration tests for health and the `/drawings` resource.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, get, post_json, send};
use draftline_db::models::drawing::CreateDrawing;
use draftline_db::repositories::{ConversionJobRepo, DrawingRepo};
use serde_json::json;
use sqlx::PgPool;

const BOUNDARY: &str = "draftline-test-boundary";

fn multipart_upload(file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/api/v1/drawings/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn seed(pool: &PgPool, name: &str) -> i64 {
    DrawingRepo::create(
        pool,
        &CreateDrawing {
            file_name: name.into(),
            original_url: format!("uploads/{name}"),
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Test: GET /health reports database health and a request id
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_returns_ok(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(common::test_state(pool, dir.path().to_path_buf()));

    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["connections"], 0);
}

// ---------------------------------------------------------------------------
// Test: upload stores the file, creates a PENDING drawing, queues FINAL
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_creates_pending_drawing_and_final_job(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(common::test_state(pool.clone(), dir.path().to_path_buf()));

    let response = send(app, multipart_upload("plan.jpg", b"jpeg-bytes")).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["fileName"], "plan.jpg");
    assert_eq!(data["status"], "PENDING");
    let id = data["id"].as_i64().unwrap();

    let original_url = data["originalUrl"].as_str().unwrap();
    assert!(original_url.ends_with("-plan.jpg"));
    assert_eq!(tokio::fs::read(original_url).await.unwrap(), b"jpeg-bytes");

    let jobs = ConversionJobRepo::list_live_by_key(&pool, &format!("FINAL-{id}"))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].payload["filePath"], original_url);
    assert_eq!(jobs[0].payload["mode"], "FINAL");
}

// ---------------------------------------------------------------------------
// Test: upload without a file field is rejected
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_without_file_is_bad_request(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(common::test_state(pool.clone(), dir.path().to_path_buf()));

    let body = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{BOUNDARY}--\r\n");
    let request = Request::post("/api/v1/drawings/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
    assert!(DrawingRepo::list(&pool).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: drawings larger than the default 2 MB extractor limit are accepted
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_accepts_multi_megabyte_drawing(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(common::test_state(pool.clone(), dir.path().to_path_buf()));
    let image = vec![0xAB_u8; 3 * 1024 * 1024];

    let response = send(app, multipart_upload("scan.jpg", &image)).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let original_url = json["data"]["originalUrl"].as_str().unwrap().to_string();
    assert_eq!(tokio::fs::read(&original_url).await.unwrap().len(), image.len());
    assert_eq!(DrawingRepo::list(&pool).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: an upload over the configured limit is 413 and stores nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_over_limit_is_payload_too_large(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let mut state = common::test_state(pool.clone(), dir.path().to_path_buf());
    let mut config = (*state.config).clone();
    config.upload_max_bytes = 1024;
    state.config = Arc::new(config);
    let app = common::build_test_app(state);

    let response = send(app, multipart_upload("big.jpg", &[0_u8; 4096])).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["code"], "PAYLOAD_TOO_LARGE");
    assert!(DrawingRepo::list(&pool).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: list returns newest first; get by id; unknown id is 404
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_and_get_drawings(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let state = common::test_state(pool.clone(), dir.path().to_path_buf());
    let first = seed(&pool, "a.jpg").await;
    let second = seed(&pool, "b.jpg").await;

    let response = get(common::build_test_app(state.clone()), "/api/v1/drawings").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);

    let response = get(
        common::build_test_app(state.clone()),
        &format!("/api/v1/drawings/{first}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["originalUrl"], "uploads/a.jpg");

    let response = get(common::build_test_app(state), "/api/v1/drawings/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: POST conversions queues a job and returns its handle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn submit_conversion_returns_accepted(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let state = common::test_state(pool.clone(), dir.path().to_path_buf());
    let id = seed(&pool, "a.jpg").await;

    let response = post_json(
        common::build_test_app(state),
        &format!("/api/v1/drawings/{id}/conversions"),
        json!({ "mode": "PREVIEW", "blockSize": 11, "cValue": 2 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["jobKey"], format!("PREVIEW-{id}"));
    assert_eq!(json["data"]["drawingId"], id);
    assert_eq!(json["data"]["replaced"], false);

    let jobs = ConversionJobRepo::list_live_by_key(&pool, &format!("PREVIEW-{id}"))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].payload["filePath"], "uploads/a.jpg");
    assert_eq!(jobs[0].payload["cValue"], 2);
}

// ---------------------------------------------------------------------------
// Test: second submission before pickup replaces the first
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_submission_replaces_waiting_job(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let state = common::test_state(pool.clone(), dir.path().to_path_buf());
    let id = seed(&pool, "a.jpg").await;
    let uri = format!("/api/v1/drawings/{id}/conversions");

    post_json(common::build_test_app(state.clone()), &uri, json!({ "mode": "PREVIEW", "blockSize": 11 })).await;
    let response = post_json(
        common::build_test_app(state),
        &uri,
        json!({ "mode": "PREVIEW", "blockSize": 15 }),
    )
    .await;

    assert_eq!(body_json(response).await["data"]["replaced"], true);
    let jobs = ConversionJobRepo::list_live_by_key(&pool, &format!("PREVIEW-{id}"))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].payload["blockSize"], 15);
}

// ---------------------------------------------------------------------------
// Test: POST conversions for an unknown drawing is 404 and queues nothing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn submit_conversion_unknown_drawing_is_404(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let state = common::test_state(pool.clone(), dir.path().to_path_buf());

    let response = post_json(
        common::build_test_app(state),
        "/api/v1/drawings/999/conversions",
        json!({ "mode": "PREVIEW" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let jobs = ConversionJobRepo::list_live_by_key(&pool, "PREVIEW-999")
        .await
        .unwrap();
    assert!(jobs.is_empty());
}
