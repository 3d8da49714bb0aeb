//! Field placement for template-backed certificates.
//!
//! Coordinate profiles are authored against a fixed 1130x1600 reference canvas
//! measured from the top-left corner. [`PageSize::scale`] maps them onto the
//! actual letter page, whose origin is bottom-left.

use crate::models::Orientation;

pub const REFERENCE_WIDTH: f64 = 1130.0;
pub const REFERENCE_HEIGHT: f64 = 1600.0;

/// US letter in points.
pub const LETTER_SHORT: f64 = 612.0;
pub const LETTER_LONG: f64 = 792.0;

/// A point on the reference canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefPoint {
    pub x: f64,
    pub y: f64,
}

pub const fn pt(x: f64, y: f64) -> RefPoint { RefPoint { x, y } }

/// An absolute point on the output page, in PDF points from the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn letter(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Landscape => Self { width: LETTER_LONG, height: LETTER_SHORT },
            Orientation::Portrait => Self { width: LETTER_SHORT, height: LETTER_LONG },
        }
    }

    pub fn scale(&self, p: RefPoint) -> PagePoint {
        PagePoint {
            x: p.x / REFERENCE_WIDTH * self.width,
            y: self.height - (p.y / REFERENCE_HEIGHT * self.height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub name: f64,
    pub course: f64,
    pub details: f64,
}

pub const DEFAULT_FONT_SIZES: FontSizes = FontSizes { name: 28.0, course: 20.0, details: 14.0 };

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateProfile {
    pub key: &'static str,
    pub name: RefPoint,
    pub course: RefPoint,
    pub start_date: RefPoint,
    pub end_date: RefPoint,
    pub certificate_id: RefPoint,
    pub fonts: FontSizes,
}

pub const RAMANASOFT_INTERNSHIP: CoordinateProfile = CoordinateProfile {
    key: "ramanasoft-internship",
    name: pt(560.0, 620.0),
    course: pt(560.0, 680.0),
    start_date: pt(150.0, 1050.0),
    end_date: pt(150.0, 1100.0),
    certificate_id: pt(150.0, 1150.0),
    fonts: DEFAULT_FONT_SIZES,
};

pub const QUALITY_THOUGHT_COMPLETION: CoordinateProfile = CoordinateProfile {
    key: "quality-thought-completion",
    name: pt(565.0, 620.0),
    course: pt(565.0, 720.0),
    start_date: pt(140.0, 1100.0),
    end_date: pt(140.0, 1160.0),
    certificate_id: pt(140.0, 1200.0),
    fonts: DEFAULT_FONT_SIZES,
};

pub const DEFAULT_PROFILE: CoordinateProfile = CoordinateProfile {
    key: "default",
    name: pt(565.0, 650.0),
    course: pt(565.0, 750.0),
    start_date: pt(140.0, 1080.0),
    end_date: pt(140.0, 1140.0),
    certificate_id: pt(140.0, 1180.0),
    fonts: DEFAULT_FONT_SIZES,
};

/// Ordered match table: first fragment contained in the haystack wins.
/// Full family names come before the short legacy fragments; among those, quality thought
/// is tried before ramanasoft.
pub const PROFILE_TABLE: &[(&str, &CoordinateProfile)] = &[
    ("ramanasoft certificate of internship", &RAMANASOFT_INTERNSHIP),
    ("quality thought certificate of completion", &QUALITY_THOUGHT_COMPLETION),
    ("qualitythought", &QUALITY_THOUGHT_COMPLETION),
    ("quality thought", &QUALITY_THOUGHT_COMPLETION),
    ("ramanasoft", &RAMANASOFT_INTERNSHIP),
];

/// Picks the coordinate profile for a template. Never fails: no match means the default profile.
pub fn resolve_profile(template_name: &str, organization: &str) -> &'static CoordinateProfile {
    resolve_in(PROFILE_TABLE, template_name, organization)
}

pub fn resolve_in(
    table: &'static [(&'static str, &'static CoordinateProfile)],
    template_name: &str,
    organization: &str,
) -> &'static CoordinateProfile {
    // Plain concatenation: a key may span the name/organization seam.
    let haystack = format!("{}{}", template_name.to_lowercase(), organization.to_lowercase());
    table
        .iter()
        .find(|(fragment, _)| haystack.contains(fragment))
        .map(|(_, profile)| *profile)
        .unwrap_or(&DEFAULT_PROFILE)
}
