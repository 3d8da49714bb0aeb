use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::{DeliveryReport, Outcome};

/// Append-only log of send attempts. Rows are never edited once written.
#[derive(Default)]
pub struct ReportLog {
    rows: RwLock<Vec<DeliveryReport>>,
}

impl ReportLog {
    pub fn new() -> Self { Self::default() }

    /// Appends one row; `retry_count` is the number of earlier rows for the same student.
    pub fn record(&self, student_id: Uuid, status: Outcome, error_message: Option<String>) -> DeliveryReport {
        let mut rows = self.rows.write();
        let retry_count = rows.iter().filter(|r| r.student_id == student_id).count() as u32;
        let report = DeliveryReport {
            id: Uuid::new_v4(),
            student_id,
            sent_at: Utc::now(),
            status,
            error_message,
            retry_count,
        };
        rows.push(report.clone());
        report
    }

    pub fn for_student(&self, student_id: Uuid) -> Vec<DeliveryReport> {
        self.rows.read().iter().filter(|r| r.student_id == student_id).cloned().collect()
    }

    pub fn len(&self) -> usize { self.rows.read().len() }

    pub fn is_empty(&self) -> bool { self.rows.read().is_empty() }
}
