use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    error::{AppError, ServiceError},
    models::{CertificateTemplate, DeliveryReport, DeliveryTicket, NewStudent, NewTemplate, Student},
    service::CertificateService,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CertificateService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/templates", post(create_template))
        .route("/api/students", post(create_student))
        .route("/api/students/:id", get(get_student))
        .route("/api/students/:id/certificate", get(download_certificate))
        .route("/api/students/:id/send", post(send_certificate))
        .route("/api/students/:id/reports", get(student_reports))
        .route("/api/deliveries/:job_id", get(delivery_status))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

pub async fn health() -> Json<serde_json::Value> { Json(json!({ "status": "ok" })) }

pub async fn create_template(
    State(state): State<AppState>,
    Json(body): Json<NewTemplate>,
) -> (StatusCode, Json<CertificateTemplate>) {
    let template = state.service.registry.register_template(body);
    (StatusCode::CREATED, Json(template))
}

pub async fn create_student(
    State(state): State<AppState>,
    Json(body): Json<NewStudent>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let student = state.service.registry.register_student(body)?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn get_student(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<Student>, AppError> {
    state.service.registry.student(id).map(Json).ok_or(ServiceError::StudentNotFound(id).into())
}

pub async fn download_certificate(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Response, AppError> {
    let (student, artifact) = state.service.generate_blocking(id).await?;

    let filename: String = format!("{}_{}.pdf", student.certificate_id, student.full_name)
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect();
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| AppError::Internal(format!("bad filename header: {}", e)))?;
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok((StatusCode::OK, headers, artifact.bytes).into_response())
}

pub async fn send_certificate(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<DeliveryTicket>), AppError> {
    let ticket = state.service.send(id).await?;
    Ok((StatusCode::ACCEPTED, Json(ticket)))
}

pub async fn delivery_status(Path(job_id): Path<Uuid>, State(state): State<AppState>) -> Response {
    match state.service.delivery_status(job_id) {
        Some(status) => Json(json!({ "job_id": job_id, "delivery": status })).into_response(),
        None => AppError::NotFound(format!("delivery {} not found", job_id)).into_response(),
    }
}

pub async fn student_reports(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DeliveryReport>>, AppError> {
    Ok(Json(state.service.reports_for(id)?))
}
