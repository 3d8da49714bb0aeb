use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no template assigned")] NoTemplate,
    #[error("template '{0}' is inactive")] InactiveTemplate(String),
    #[error("pdf error: {0}")] Pdf(String),
    #[error(transparent)] Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid artifact name: {0}")] InvalidName(String),
    #[error("io error: {0}")] Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")] InvalidAddress(String),
    #[error("message build error: {0}")] Build(String),
    #[error("transport error: {0}")] Transport(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("student {0} not found")] StudentNotFound(Uuid),
    #[error("template {0} not found")] TemplateNotFound(Uuid),
    #[error("Failed to generate certificate")] GenerationFailed,
    #[error("delivery queue closed")] QueueClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")] Missing(&'static str),
    #[error("invalid value for {key}: {value}")] Invalid { key: &'static str, value: String },
}

/// HTTP-facing error; everything a handler returns funnels through here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)] Service(#[from] ServiceError),
    #[error("{0}")] NotFound(String),
    #[error("{0}")] Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Service(ServiceError::StudentNotFound(_))
            | AppError::Service(ServiceError::TemplateNotFound(_))
            | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Service(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        }
        (status, Json(json!({ "status": "error", "message": self.to_string() }))).into_response()
    }
}
