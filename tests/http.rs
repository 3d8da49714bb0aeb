use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use certforge::{config::Config, mailer::DemoMailer, routes};

fn test_config(dir: &TempDir) -> Config {
    let root = dir.path().to_string_lossy().into_owned();
    Config::from_lookup(move |key| match key {
        "MEDIA_ROOT" => Some(root.clone()),
        _ => None,
    })
    .unwrap()
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn asha() -> Value {
    json!({
        "full_name": "Asha Rao",
        "email": "asha@example.com",
        "specialization": "Data Science",
        "course": "AI Internship",
        "organization": "RamanaSoft",
        "start_date": "2025-01-01",
        "end_date": "2025-06-01"
    })
}

async fn wait_for_delivery(app: &axum::Router, job_id: &str) -> Value {
    for _ in 0..200 {
        let (status, body) = send_json(app, "GET", &format!("/api/deliveries/{job_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        if body["delivery"]["status"] != "pending" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("delivery {job_id} stayed pending");
}

#[tokio::test]
async fn health_check() {
    let dir = tempfile::tempdir().unwrap();
    let app = routes::router(certforge::build_state(&test_config(&dir), Arc::new(DemoMailer)));
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn templated_certificate_download_and_send() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::from_pixel(226, 320, image::Rgb([255, 250, 240]))
        .save(dir.path().join("ramanasoft.png"))
        .unwrap();
    let app = routes::router(certforge::build_state(&test_config(&dir), Arc::new(DemoMailer)));

    let (status, template) = send_json(&app, "POST", "/api/templates", Some(json!({
        "name": "RamanaSoft Certificate of Internship",
        "organization": "RamanaSoft",
        "specialization": "Data Science",
        "course": "AI Internship",
        "orientation": "landscape",
        "asset_path": "ramanasoft.png"
    }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(template["is_active"], true);

    let (status, student) = send_json(&app, "POST", "/api/students", Some(asha())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(student["certificate_id"], "2025000001");
    assert_eq!(student["template_id"], template["id"]);
    let id = student["id"].as_str().unwrap().to_string();

    let (status, pdf) = send(&app, "GET", &format!("/api/students/{id}/certificate"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(pdf.starts_with(b"%PDF"));
    assert!(dir.path().join("certificates/2025000001_Asha_Rao.pdf").is_file());

    let (status, ticket) = send_json(&app, "POST", &format!("/api/students/{id}/send"), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(ticket["status"], "pending");
    let job_id = ticket["job_id"].as_str().unwrap().to_string();

    let done = wait_for_delivery(&app, &job_id).await;
    assert_eq!(done["delivery"], json!({ "status": "success" }));

    let (status, reports) = send_json(&app, "GET", &format!("/api/students/{id}/reports"), None).await;
    assert_eq!(status, StatusCode::OK);
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["status"], "success");
    assert_eq!(reports[0]["retry_count"], 0);

    let (_, student) = send_json(&app, "GET", &format!("/api/students/{id}"), None).await;
    assert_eq!(student["certificate_generated"], true);
}

#[tokio::test]
async fn student_without_template_gets_plain_certificate() {
    let dir = tempfile::tempdir().unwrap();
    let app = routes::router(certforge::build_state(&test_config(&dir), Arc::new(DemoMailer)));

    let (_, student) = send_json(&app, "POST", "/api/students", Some(asha())).await;
    assert_eq!(student["template_id"], Value::Null);
    let id = student["id"].as_str().unwrap();

    let (status, pdf) = send(&app, "GET", &format!("/api/students/{id}/certificate"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(pdf.starts_with(b"%PDF"));
    assert!(dir.path().join("certificates/2025000001_Asha_Rao.pdf").is_file());
}

#[tokio::test]
async fn unknown_ids_are_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = routes::router(certforge::build_state(&test_config(&dir), Arc::new(DemoMailer)));
    let missing = uuid::Uuid::new_v4();

    for (method, uri) in [
        ("GET", format!("/api/students/{missing}")),
        ("GET", format!("/api/students/{missing}/certificate")),
        ("POST", format!("/api/students/{missing}/send")),
        ("GET", format!("/api/students/{missing}/reports")),
        ("GET", format!("/api/deliveries/{missing}")),
    ] {
        let (status, body) = send_json(&app, method, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body["status"], "error");
    }
}

#[tokio::test]
async fn explicit_unknown_template_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = routes::router(certforge::build_state(&test_config(&dir), Arc::new(DemoMailer)));
    let mut body = asha();
    body["template_id"] = json!(uuid::Uuid::new_v4());
    let (status, _) = send_json(&app, "POST", "/api/students", Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
