use serde::{Serialize, Deserialize};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CertificateTemplate {
    pub id: Uuid,
    pub name: String,
    pub organization: String,
    pub specialization: String,
    pub course: String,
    pub orientation: Orientation,
    /// Background asset; relative paths resolve against the configured assets root.
    pub asset_path: PathBuf,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub organization: String,
    pub specialization: String,
    pub course: String,
    #[serde(default)]
    pub orientation: Orientation,
    pub asset_path: PathBuf,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Student {
    pub id: Uuid,
    pub certificate_id: String,
    pub full_name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub specialization: String,
    pub course: String,
    pub organization: String,
    pub institution: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub template_id: Option<Uuid>,
    pub certificate_generated: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewStudent {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub mobile: Option<String>,
    pub specialization: String,
    pub course: String,
    pub organization: String,
    #[serde(default = "default_institution")]
    pub institution: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Explicit template; when absent one is matched from the active templates.
    #[serde(default)]
    pub template_id: Option<Uuid>,
}

pub fn default_institution() -> String { "Quality Thought Institution".to_string() }

/// Terminal outcome of a single send attempt.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeliveryReport {
    pub id: Uuid,
    pub student_id: Uuid,
    pub sent_at: DateTime<Utc>,
    pub status: Outcome,
    pub error_message: Option<String>,
    pub retry_count: u32,
}

/// Observable state of a queued delivery job.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Success,
    Failed(String),
}

impl DeliveryStatus {
    pub fn is_terminal(&self) -> bool { !matches!(self, DeliveryStatus::Pending) }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeliveryTicket {
    pub job_id: Uuid,
    pub status: String,
}
