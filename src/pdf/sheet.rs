use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;
use std::io::BufWriter;

use super::{metrics::Face, Canvas, TextPlacement};
use crate::{error::RenderError, layout::PageSize};

fn pdf_err(e: impl std::fmt::Display) -> RenderError { RenderError::Pdf(e.to_string()) }

fn at(x: f64, y: f64) -> Point { Point::new(Mm::from(Pt(x as f32)), Mm::from(Pt(y as f32))) }

fn rgb(r: f32, g: f32, b: f32) -> Color { Color::Rgb(Rgb::new(r, g, b, None)) }

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

/// One-page PDF canvas working in points with a bottom-left origin.
pub(crate) struct Sheet {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    page: PageSize,
}

impl Sheet {
    pub fn new(title: &str, page: PageSize) -> Result<Self, RenderError> {
        let (doc, page_idx, layer_idx) = PdfDocument::new(
            title,
            Mm::from(Pt(page.width as f32)),
            Mm::from(Pt(page.height as f32)),
            "Certificate",
        );
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
            oblique: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_err)?,
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        Ok(Self { doc, layer, fonts, page })
    }

    fn rect_points(x: f64, y: f64, w: f64, h: f64) -> Vec<(Point, bool)> {
        vec![
            (at(x, y), false),
            (at(x + w, y), false),
            (at(x + w, y + h), false),
            (at(x, y + h), false),
        ]
    }

    pub fn fill_page(&self, r: f32, g: f32, b: f32) {
        self.layer.set_fill_color(rgb(r, g, b));
        self.layer.add_polygon(Polygon {
            rings: vec![Self::rect_points(0.0, 0.0, self.page.width, self.page.height)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    pub fn stroke_rect(&self, x: f64, y: f64, w: f64, h: f64, thickness: f32) {
        self.layer.set_outline_color(rgb(0.0, 0.0, 0.0));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line { points: Self::rect_points(x, y, w, h), is_closed: true });
    }

    pub fn line(&self, x1: f64, y1: f64, x2: f64, y2: f64, thickness: f32) {
        self.layer.set_outline_color(rgb(0.0, 0.0, 0.0));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line { points: vec![(at(x1, y1), false), (at(x2, y2), false)], is_closed: false });
    }

    /// Stretches `img` over the whole page.
    pub fn background_image(&self, img: &::image::RgbImage) {
        let (w, h) = img.dimensions();
        let xobject = ImageXObject {
            width: Px(w as usize),
            height: Px(h as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: img.as_raw().clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        };
        // At 72 dpi one pixel is one point, so the scale is page size over pixel count.
        Image::from(xobject).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                scale_x: Some((self.page.width / w as f64) as f32),
                scale_y: Some((self.page.height / h as f64) as f32),
                dpi: Some(72.0),
                ..Default::default()
            },
        );
    }

    pub fn text(&self, t: &TextPlacement) {
        let font = match t.face {
            Face::Regular => &self.fonts.regular,
            Face::Bold => &self.fonts.bold,
            Face::Oblique => &self.fonts.oblique,
        };
        let origin = t.origin();
        self.layer.set_fill_color(rgb(0.0, 0.0, 0.0));
        self.layer.use_text(
            t.text.clone(),
            t.size as f32,
            Mm::from(Pt(origin.x as f32)),
            Mm::from(Pt(origin.y as f32)),
            font,
        );
    }

    pub fn finish(self) -> Result<Vec<u8>, RenderError> {
        let mut buf: Vec<u8> = Vec::new();
        {
            let mut writer = BufWriter::new(&mut buf);
            self.doc.save(&mut writer).map_err(pdf_err)?;
        }
        Ok(buf)
    }
}

impl Canvas for Sheet {
    fn fill_page(&self, r: f32, g: f32, b: f32) { Sheet::fill_page(self, r, g, b) }

    fn background_image(&self, img: &::image::RgbImage) { Sheet::background_image(self, img) }

    fn text(&self, t: &TextPlacement) { Sheet::text(self, t) }
}
