use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    models::{CertificateTemplate, NewStudent, NewTemplate, Student},
};

pub const CERTIFICATE_ID_PREFIX: &str = "202500";

#[derive(Default)]
struct Records {
    /// Registration order matters: template matching takes the first hit.
    templates: Vec<CertificateTemplate>,
    students: HashMap<Uuid, Student>,
    last_certificate_id: Option<String>,
}

/// In-memory record store for templates and students.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Records>,
}

fn next_certificate_id(last: Option<&str>) -> String {
    let last_seq = last
        .and_then(|id| id.rsplit(CERTIFICATE_ID_PREFIX).next())
        .and_then(|seq| seq.parse::<u32>().ok())
        .unwrap_or(0);
    format!("{}{:04}", CERTIFICATE_ID_PREFIX, last_seq + 1)
}

fn same(a: &str, b: &str) -> bool { a.trim().eq_ignore_ascii_case(b.trim()) }

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn register_template(&self, new: NewTemplate) -> CertificateTemplate {
        let template = CertificateTemplate {
            id: Uuid::new_v4(),
            name: new.name,
            organization: new.organization,
            specialization: new.specialization,
            course: new.course,
            orientation: new.orientation,
            asset_path: new.asset_path,
            is_active: new.is_active,
            created_at: Utc::now(),
        };
        self.inner.write().templates.push(template.clone());
        info!("Registered template '{}' ({})", template.name, template.id);
        template
    }

    /// First active template for the organization/specialization/course triple.
    /// Later duplicates are never considered.
    pub fn match_template(&self, organization: &str, specialization: &str, course: &str) -> Option<CertificateTemplate> {
        self.inner
            .read()
            .templates
            .iter()
            .find(|t| {
                t.is_active
                    && same(&t.organization, organization)
                    && same(&t.specialization, specialization)
                    && same(&t.course, course)
            })
            .cloned()
    }

    pub fn register_student(&self, new: NewStudent) -> Result<Student, ServiceError> {
        let template_id = match new.template_id {
            Some(id) => Some(self.template(id).ok_or(ServiceError::TemplateNotFound(id))?.id),
            None => self.match_template(&new.organization, &new.specialization, &new.course).map(|t| t.id),
        };
        if template_id.is_none() {
            warn!(
                "⚠️ No active certificate template for {} / {} / {}",
                new.organization, new.specialization, new.course
            );
        }

        let mut records = self.inner.write();
        let certificate_id = next_certificate_id(records.last_certificate_id.as_deref());
        let student = Student {
            id: Uuid::new_v4(),
            certificate_id: certificate_id.clone(),
            full_name: new.full_name,
            email: new.email,
            mobile: new.mobile,
            specialization: new.specialization,
            course: new.course,
            organization: new.organization,
            institution: new.institution,
            start_date: new.start_date,
            end_date: new.end_date,
            template_id,
            certificate_generated: false,
            created_at: Utc::now(),
        };
        records.last_certificate_id = Some(certificate_id);
        records.students.insert(student.id, student.clone());
        info!("Registered student {} ({})", student.full_name, student.certificate_id);
        Ok(student)
    }

    pub fn student(&self, id: Uuid) -> Option<Student> { self.inner.read().students.get(&id).cloned() }

    pub fn template(&self, id: Uuid) -> Option<CertificateTemplate> {
        self.inner.read().templates.iter().find(|t| t.id == id).cloned()
    }

    pub fn resolved_template(&self, student: &Student) -> Option<CertificateTemplate> {
        student.template_id.and_then(|id| self.template(id))
    }

    pub fn mark_generated(&self, id: Uuid) {
        if let Some(student) = self.inner.write().students.get_mut(&id) {
            student.certificate_generated = true;
        }
    }
}
