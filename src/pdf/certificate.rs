use bytes::Bytes;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{metrics::Face, sheet::Sheet, Artifact, Canvas, TextPlacement};
use crate::{
    error::RenderError,
    layout::{pt, resolve_profile, PageSize},
    models::{CertificateTemplate, Student},
    storage::{certificate_name, ArtifactStore},
};

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

#[derive(Debug, Clone, PartialEq)]
pub struct CertificateLayout {
    pub page: PageSize,
    pub profile: &'static str,
    /// Name, course line, start date, end date, certificate id, in that order.
    pub fields: Vec<TextPlacement>,
    pub footer: TextPlacement,
}

/// Lays out the five student fields and the audit footer for `template`.
pub fn plan(student: &Student, template: &CertificateTemplate, generated_at: NaiveDateTime) -> CertificateLayout {
    let page = PageSize::letter(template.orientation);
    let profile = resolve_profile(&template.name, &template.organization);
    let sizes = profile.fonts;

    let fields = vec![
        TextPlacement::centered(student.full_name.clone(), Face::Bold, sizes.name, page.scale(profile.name)),
        TextPlacement::centered(
            format!("To be recognized as a {} - {}", student.course, student.specialization),
            Face::Regular,
            sizes.course,
            page.scale(profile.course),
        ),
        TextPlacement::left(
            format!("Start Date : {}", student.start_date.format("%d/%m/%Y")),
            Face::Bold,
            sizes.details,
            page.scale(profile.start_date),
        ),
        TextPlacement::left(
            format!("End Date : {}", student.end_date.format("%d/%m/%Y")),
            Face::Bold,
            sizes.details,
            page.scale(profile.end_date),
        ),
        TextPlacement::left(
            format!("Certification Id : {}", student.certificate_id),
            Face::Bold,
            sizes.details,
            page.scale(profile.certificate_id),
        ),
    ];
    let footer = TextPlacement::left(
        format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        Face::Oblique,
        10.0,
        page.scale(pt(100.0, 1550.0)),
    );

    CertificateLayout { page, profile: profile.key, fields, footer }
}

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decodes the template background, or `None` when a plain page should be used instead.
pub fn load_background(path: &Path) -> Option<::image::RgbImage> {
    if !has_image_extension(path) {
        info!("Template asset {} is not an image, using plain background", path.display());
        return None;
    }
    match ::image::open(path) {
        Ok(img) => Some(img.to_rgb8()),
        Err(e) => {
            warn!("⚠️ Error loading image template {}: {}", path.display(), e);
            None
        }
    }
}

/// Background (or plain white) first, then every field and the footer on top.
pub(crate) fn paint(canvas: &impl Canvas, layout: &CertificateLayout, background: Option<&::image::RgbImage>) {
    match background {
        Some(img) => canvas.background_image(img),
        None => canvas.fill_page(1.0, 1.0, 1.0),
    }
    for field in &layout.fields {
        canvas.text(field);
    }
    canvas.text(&layout.footer);
}

pub fn draw(layout: &CertificateLayout, background: Option<&::image::RgbImage>, title: &str) -> Result<Vec<u8>, RenderError> {
    let sheet = Sheet::new(title, layout.page)?;
    paint(&sheet, layout, background);
    sheet.finish()
}

/// Renders certificates over a template's background image.
pub struct CertificateRenderer {
    store: Arc<dyn ArtifactStore>,
    assets_root: PathBuf,
}

impl CertificateRenderer {
    pub fn new(store: Arc<dyn ArtifactStore>, assets_root: impl Into<PathBuf>) -> Self {
        Self { store, assets_root: assets_root.into() }
    }

    /// Renders and persists the certificate. `None` means no artifact was produced and the
    /// caller should fall back; nothing escapes as an error.
    pub fn render_certificate(&self, student: &Student, template: Option<&CertificateTemplate>) -> Option<Artifact> {
        match self.try_render(student, template) {
            Ok(artifact) => {
                info!("✅ Certificate {} rendered to {}", student.certificate_id, artifact.path);
                Some(artifact)
            }
            Err(e @ (RenderError::NoTemplate | RenderError::InactiveTemplate(_))) => {
                warn!("⚠️ Certificate {} not rendered from template: {}", student.certificate_id, e);
                None
            }
            Err(e) => {
                error!("❌ Error generating certificate {}: {}", student.certificate_id, e);
                None
            }
        }
    }

    fn try_render(&self, student: &Student, template: Option<&CertificateTemplate>) -> Result<Artifact, RenderError> {
        let template = template.ok_or(RenderError::NoTemplate)?;
        if !template.is_active {
            return Err(RenderError::InactiveTemplate(template.name.clone()));
        }

        let layout = plan(student, template, chrono::Local::now().naive_local());
        let background = load_background(&self.assets_root.join(&template.asset_path));
        let bytes = draw(&layout, background.as_ref(), &format!("Certificate {}", student.certificate_id))?;

        let path = self.store.save(&certificate_name(student), &bytes)?;
        Ok(Artifact { path, bytes: Bytes::from(bytes) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PagePoint;
    use crate::models::Orientation;
    use crate::storage::FsArtifactStore;
    use chrono::{NaiveDate, Utc};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use uuid::Uuid;

    #[derive(Debug, PartialEq)]
    enum Op {
        Fill(f32, f32, f32),
        Image(u32, u32),
        Text(String),
    }

    #[derive(Default)]
    struct Recorder {
        ops: RefCell<Vec<Op>>,
    }

    impl Canvas for Recorder {
        fn fill_page(&self, r: f32, g: f32, b: f32) { self.ops.borrow_mut().push(Op::Fill(r, g, b)) }

        fn background_image(&self, img: &::image::RgbImage) {
            let (w, h) = img.dimensions();
            self.ops.borrow_mut().push(Op::Image(w, h))
        }

        fn text(&self, t: &TextPlacement) { self.ops.borrow_mut().push(Op::Text(t.text.clone())) }
    }

    fn painted(layout: &CertificateLayout, background: Option<&::image::RgbImage>) -> Vec<Op> {
        let canvas = Recorder::default();
        paint(&canvas, layout, background);
        canvas.ops.into_inner()
    }

    fn asha() -> Student {
        Student {
            id: Uuid::new_v4(),
            certificate_id: "2025000007".into(),
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
            certificate_generated: false,
            created_at: Utc::now(),
        }
    }

    fn ramanasoft(asset: &str) -> CertificateTemplate {
        CertificateTemplate {
            id: Uuid::new_v4(),
            name: "RamanaSoft Certificate of Internship".into(),
            organization: "RamanaSoft".into(),
            specialization: "Data Science".into(),
            course: "AI Internship".into(),
            orientation: Orientation::Landscape,
            asset_path: asset.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn generated_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(9, 30, 0).unwrap()
    }

    #[test]
    fn plan_places_name_at_scaled_profile_point() {
        let layout = plan(&asha(), &ramanasoft("bg.png"), generated_at());
        assert_eq!(layout.profile, "ramanasoft-internship");
        assert_eq!(layout.page, PageSize { width: 792.0, height: 612.0 });

        let name = &layout.fields[0];
        assert_eq!(name.text, "Asha Rao");
        assert_eq!(name.face, Face::Bold);
        let expected = PagePoint { x: 560.0 / 1130.0 * 792.0, y: 612.0 - 620.0 / 1600.0 * 612.0 };
        assert!((name.anchor.x - expected.x).abs() < 1e-9);
        assert!((name.anchor.y - expected.y).abs() < 1e-9);
    }

    #[test]
    fn plan_formats_all_five_fields() {
        let layout = plan(&asha(), &ramanasoft("bg.png"), generated_at());
        let texts: Vec<&str> = layout.fields.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Asha Rao",
                "To be recognized as a AI Internship - Data Science",
                "Start Date : 01/01/2025",
                "End Date : 01/06/2025",
                "Certification Id : 2025000007",
            ]
        );
        assert_eq!(layout.footer.text, "Generated on: 2025-06-02 09:30:00");
    }

    #[test]
    fn portrait_template_uses_portrait_page() {
        let mut template = ramanasoft("bg.png");
        template.orientation = Orientation::Portrait;
        template.name = "Merit".into();
        template.organization = "Acme".into();
        let layout = plan(&asha(), &template, generated_at());
        assert_eq!(layout.profile, "default");
        assert_eq!(layout.page, PageSize { width: 612.0, height: 792.0 });
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(has_image_extension(Path::new("a/b/BG.JPG")));
        assert!(has_image_extension(Path::new("bg.bmp")));
        assert!(!has_image_extension(Path::new("bg.pdf")));
        assert!(!has_image_extension(Path::new("bg")));
    }

    #[test]
    fn missing_template_produces_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CertificateRenderer::new(Arc::new(FsArtifactStore::new(dir.path())), dir.path());
        assert!(renderer.render_certificate(&asha(), None).is_none());

        let mut inactive = ramanasoft("bg.png");
        inactive.is_active = false;
        assert!(renderer.render_certificate(&asha(), Some(&inactive)).is_none());
    }

    #[test]
    fn unreadable_background_degrades_to_plain_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        let store = Arc::new(FsArtifactStore::new(dir.path()));
        let renderer = CertificateRenderer::new(store.clone(), dir.path());

        for asset in ["broken.png", "missing.jpg", "template.docx"] {
            let artifact = renderer.render_certificate(&asha(), Some(&ramanasoft(asset))).unwrap();
            assert!(artifact.bytes.starts_with(b"%PDF"));
            assert!(store.exists(&artifact.path));
        }

        let background = load_background(&dir.path().join("broken.png"));
        assert!(background.is_none());
        let layout = plan(&asha(), &ramanasoft("broken.png"), generated_at());
        let mut expected = vec![Op::Fill(1.0, 1.0, 1.0)];
        expected.extend(layout.fields.iter().map(|f| Op::Text(f.text.clone())));
        expected.push(Op::Text(layout.footer.text.clone()));
        assert_eq!(painted(&layout, background.as_ref()), expected);
        assert_eq!(expected.len(), 7);
    }

    #[test]
    fn image_background_is_painted_under_the_fields() {
        let layout = plan(&asha(), &ramanasoft("bg.png"), generated_at());
        let img = ::image::RgbImage::new(113, 160);
        let ops = painted(&layout, Some(&img));
        assert_eq!(ops[0], Op::Image(113, 160));
        assert_eq!(ops.len(), 7);
        assert!(!ops.iter().any(|op| matches!(op, Op::Fill(..))));
    }

    #[test]
    fn image_background_is_embedded() {
        let dir = tempfile::tempdir().unwrap();
        ::image::RgbImage::from_pixel(113, 160, ::image::Rgb([240, 230, 200]))
            .save(dir.path().join("bg.png"))
            .unwrap();
        assert!(load_background(&dir.path().join("bg.png")).is_some());

        let renderer = CertificateRenderer::new(Arc::new(FsArtifactStore::new(dir.path())), dir.path());
        let artifact = renderer.render_certificate(&asha(), Some(&ramanasoft("bg.png"))).unwrap();
        assert_eq!(artifact.path, "certificates/2025000007_Asha_Rao.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn rerendering_reuses_the_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CertificateRenderer::new(Arc::new(FsArtifactStore::new(dir.path())), dir.path());
        let student = asha();
        let template = ramanasoft("none.png");
        let first = renderer.render_certificate(&student, Some(&template)).unwrap();
        let second = renderer.render_certificate(&student, Some(&template)).unwrap();
        assert_eq!(first.path, second.path);
        let files = std::fs::read_dir(dir.path().join("certificates")).unwrap().count();
        assert_eq!(files, 1);
    }
}
