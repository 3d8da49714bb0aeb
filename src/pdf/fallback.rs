use bytes::Bytes;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{error, info};

use super::{metrics::Face, sheet::Sheet, Artifact, TextPlacement};
use crate::{
    error::RenderError,
    layout::{PagePoint, PageSize},
    models::{Orientation, Student},
    storage::{certificate_name, ArtifactStore},
};

pub const TITLE: &str = "CERTIFICATE OF COMPLETION";
const BORDER_INSET: f64 = 20.0;

/// Template-free layout: portrait letter, every line centred except the audit footer.
pub fn plan(student: &Student, now: NaiveDateTime) -> (PageSize, Vec<TextPlacement>) {
    let page = PageSize::letter(Orientation::Portrait);
    let (w, h) = (page.width, page.height);
    let mid = |y: f64| PagePoint { x: w / 2.0, y };
    let long_date = |d: chrono::NaiveDate| d.format("%B %d, %Y").to_string();

    let lines = vec![
        TextPlacement::centered(TITLE, Face::Bold, 24.0, mid(h - 100.0)),
        TextPlacement::centered(format!("This certifies that {}", student.full_name), Face::Bold, 20.0, mid(h - 180.0)),
        TextPlacement::centered(
            format!("has successfully completed {}", student.specialization),
            Face::Regular,
            16.0,
            mid(h - 220.0),
        ),
        TextPlacement::centered(format!("at {}", student.organization), Face::Regular, 16.0, mid(h - 260.0)),
        TextPlacement::centered(
            format!("from {} to {}", long_date(student.start_date), long_date(student.end_date)),
            Face::Regular,
            16.0,
            mid(h - 300.0),
        ),
        TextPlacement::centered(format!("Certificate ID: {}", student.certificate_id), Face::Oblique, 14.0, mid(h - 340.0)),
        TextPlacement::centered(format!("Date: {}", now.format("%B %d, %Y")), Face::Oblique, 14.0, mid(h - 380.0)),
        TextPlacement::centered("_________________________", Face::Regular, 12.0, mid(150.0)),
        TextPlacement::centered("Authorized Signature", Face::Regular, 12.0, mid(130.0)),
        TextPlacement::left(
            format!("Generated on: {}", now.format("%Y-%m-%d %H:%M:%S")),
            Face::Oblique,
            10.0,
            PagePoint { x: 50.0, y: 50.0 },
        ),
    ];
    (page, lines)
}

fn draw(page: PageSize, lines: &[TextPlacement], title: &str) -> Result<Vec<u8>, RenderError> {
    let sheet = Sheet::new(title, page)?;
    sheet.fill_page(0.95, 0.95, 0.95);
    sheet.stroke_rect(
        BORDER_INSET,
        BORDER_INSET,
        page.width - 2.0 * BORDER_INSET,
        page.height - 2.0 * BORDER_INSET,
        2.0,
    );
    sheet.line(50.0, page.height - 120.0, page.width - 50.0, page.height - 120.0, 1.0);
    for line in lines {
        sheet.text(line);
    }
    sheet.finish()
}

/// Plain certificate used when the template path yields nothing.
pub struct FallbackRenderer {
    store: Arc<dyn ArtifactStore>,
}

impl FallbackRenderer {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self { Self { store } }

    pub fn render_fallback_certificate(&self, student: &Student) -> Option<Artifact> {
        match self.try_render(student) {
            Ok(artifact) => {
                info!("✅ Simple certificate {} rendered to {}", student.certificate_id, artifact.path);
                Some(artifact)
            }
            Err(e) => {
                error!("❌ Error generating simple certificate {}: {}", student.certificate_id, e);
                None
            }
        }
    }

    fn try_render(&self, student: &Student) -> Result<Artifact, RenderError> {
        let (page, lines) = plan(student, chrono::Local::now().naive_local());
        let bytes = draw(page, &lines, &format!("Certificate {}", student.certificate_id))?;
        let path = self.store.save(&certificate_name(student), &bytes)?;
        Ok(Artifact { path, bytes: Bytes::from(bytes) })
    }
}
