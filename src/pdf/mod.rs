//! Certificate rendering.
//!
//! Both renderers lay a page out as plain data first ([`TextPlacement`]s on a
//! [`PageSize`]) and only then hand it to [`sheet::Sheet`] for drawing, so
//! placement can be checked without parsing PDF output.

pub mod certificate;
pub mod fallback;
pub mod metrics;
mod sheet;

use bytes::Bytes;

use crate::layout::PagePoint;
pub use certificate::CertificateRenderer;
pub use fallback::FallbackRenderer;
pub use metrics::Face;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub text: String,
    pub face: Face,
    pub size: f64,
    pub align: Align,
    /// Anchor on the baseline: left edge or centre, depending on `align`.
    pub anchor: PagePoint,
}

impl TextPlacement {
    pub fn left(text: impl Into<String>, face: Face, size: f64, anchor: PagePoint) -> Self {
        Self { text: text.into(), face, size, align: Align::Left, anchor }
    }

    pub fn centered(text: impl Into<String>, face: Face, size: f64, anchor: PagePoint) -> Self {
        Self { text: text.into(), face, size, align: Align::Center, anchor }
    }

    /// Where the text run starts on the baseline.
    pub fn origin(&self) -> PagePoint {
        match self.align {
            Align::Left => self.anchor,
            Align::Center => PagePoint {
                x: self.anchor.x - metrics::text_width(self.face, &self.text, self.size) / 2.0,
                y: self.anchor.y,
            },
        }
    }
}

/// Page surface the certificate layout is painted onto. [`sheet::Sheet`] writes PDF.
pub(crate) trait Canvas {
    fn fill_page(&self, r: f32, g: f32, b: f32);
    fn background_image(&self, img: &::image::RgbImage);
    fn text(&self, t: &TextPlacement);
}

/// A rendered certificate: the PDF bytes and the store handle they were saved under.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: String,
    pub bytes: Bytes,
}
