use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    delivery::DeliveryQueue,
    error::ServiceError,
    models::{DeliveryReport, DeliveryStatus, DeliveryTicket, Student},
    pdf::{Artifact, CertificateRenderer, FallbackRenderer},
    reports::ReportLog,
    storage::{certificate_name, is_flat_name},
    store::Registry,
};

/// Ties the record store, both renderers and the delivery queue together.
pub struct CertificateService {
    pub registry: Arc<Registry>,
    pub reports: Arc<ReportLog>,
    renderer: CertificateRenderer,
    fallback: FallbackRenderer,
    queue: DeliveryQueue,
}

impl CertificateService {
    pub fn new(
        registry: Arc<Registry>,
        reports: Arc<ReportLog>,
        renderer: CertificateRenderer,
        fallback: FallbackRenderer,
        queue: DeliveryQueue,
    ) -> Self {
        Self { registry, reports, renderer, fallback, queue }
    }

    /// Template render first, plain certificate second. Only a double failure is an error.
    pub fn generate(&self, student_id: Uuid) -> Result<(Student, Artifact), ServiceError> {
        let mut student = self.registry.student(student_id).ok_or(ServiceError::StudentNotFound(student_id))?;
        let template = self.registry.resolved_template(&student);
        if !is_flat_name(&student.full_name) {
            error!(
                "❌ Name {:?} of student {} contains a path separator; certificate goes to {} and fails if that leaves the store",
                student.full_name,
                student.certificate_id,
                certificate_name(&student)
            );
        }

        let artifact = match self.renderer.render_certificate(&student, template.as_ref()) {
            Some(artifact) => artifact,
            None => {
                warn!("🔄 Falling back to simple certificate for {}", student.certificate_id);
                self.fallback
                    .render_fallback_certificate(&student)
                    .ok_or(ServiceError::GenerationFailed)?
            }
        };

        self.registry.mark_generated(student.id);
        student.certificate_generated = true;
        Ok((student, artifact))
    }

    /// Runs [`Self::generate`] off the async runtime.
    pub async fn generate_blocking(self: &Arc<Self>, student_id: Uuid) -> Result<(Student, Artifact), ServiceError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.generate(student_id))
            .await
            .map_err(|e| {
                error!("❌ Certificate generation task failed: {}", e);
                ServiceError::GenerationFailed
            })?
    }

    /// Generates the certificate and queues it for email. Returns as soon as the job is queued.
    pub async fn send(self: &Arc<Self>, student_id: Uuid) -> Result<DeliveryTicket, ServiceError> {
        let (student, artifact) = self.generate_blocking(student_id).await?;
        let certificate_id = student.certificate_id.clone();
        let job_id = self.queue.enqueue(student, artifact.path).await?;
        info!("Queued delivery {} for certificate {}", job_id, certificate_id);
        Ok(DeliveryTicket { job_id, status: "pending".to_string() })
    }

    pub fn delivery_status(&self, job_id: Uuid) -> Option<DeliveryStatus> { self.queue.status(job_id) }

    pub fn reports_for(&self, student_id: Uuid) -> Result<Vec<DeliveryReport>, ServiceError> {
        self.registry.student(student_id).ok_or(ServiceError::StudentNotFound(student_id))?;
        Ok(self.reports.for_student(student_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::DemoMailer;
    use crate::models::{NewStudent, NewTemplate, Orientation};
    use crate::storage::{ArtifactStore, FsArtifactStore};
    use chrono::NaiveDate;

    fn service(dir: &std::path::Path) -> Arc<CertificateService> {
        let store: Arc<dyn ArtifactStore> = Arc::new(FsArtifactStore::new(dir));
        let reports = Arc::new(ReportLog::new());
        let queue = DeliveryQueue::start(4, 16, Arc::new(DemoMailer), store.clone(), reports.clone());
        Arc::new(CertificateService::new(
            Arc::new(Registry::new()),
            reports,
            CertificateRenderer::new(store.clone(), dir),
            FallbackRenderer::new(store),
            queue,
        ))
    }

    fn new_student() -> NewStudent {
        NewStudent {
            full_name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            mobile: None,
            specialization: "Data Science".into(),
            course: "AI Internship".into(),
            organization: "RamanaSoft".into(),
            institution: "Quality Thought Institution".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            template_id: None,
        }
    }

    #[tokio::test]
    async fn student_without_template_gets_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let s = svc.registry.register_student(new_student()).unwrap();
        assert!(s.template_id.is_none());

        let (student, artifact) = svc.generate(s.id).unwrap();
        assert!(student.certificate_generated);
        assert_eq!(artifact.path, "certificates/2025000001_Asha_Rao.pdf");
        assert!(svc.registry.student(s.id).unwrap().certificate_generated);
    }

    #[tokio::test]
    async fn templated_student_uses_template() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        svc.registry.register_template(NewTemplate {
            name: "RamanaSoft Certificate of Internship".into(),
            organization: "RamanaSoft".into(),
            specialization: "Data Science".into(),
            course: "AI Internship".into(),
            orientation: Orientation::Landscape,
            asset_path: "missing.png".into(),
            is_active: true,
        });
        let s = svc.registry.register_student(new_student()).unwrap();
        assert!(s.template_id.is_some());
        let (_, artifact) = svc.generate_blocking(s.id).await.unwrap();
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn path_separators_in_names_nest_or_fail() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let nested = svc.registry.register_student(NewStudent { full_name: "Asha/Rao".into(), ..new_student() }).unwrap();
        let (_, artifact) = svc.generate(nested.id).unwrap();
        assert_eq!(artifact.path, "certificates/2025000001_Asha/Rao.pdf");

        let escaping =
            svc.registry.register_student(NewStudent { full_name: "Asha/../Rao".into(), ..new_student() }).unwrap();
        assert!(matches!(svc.generate(escaping.id), Err(ServiceError::GenerationFailed)));
        assert!(!svc.registry.student(escaping.id).unwrap().certificate_generated);
    }

    #[tokio::test]
    async fn unknown_student_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        assert!(matches!(svc.generate(Uuid::new_v4()), Err(ServiceError::StudentNotFound(_))));
        assert!(matches!(svc.send(Uuid::new_v4()).await, Err(ServiceError::StudentNotFound(_))));
    }
}
