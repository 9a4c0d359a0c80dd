//! # Badge composition values
//!
//! The request an operator submits, the plan handed to a document renderer,
//! and what comes back.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::templates::{CodeField, NameField, PageSize, TemplateCode};

fn enabled() -> bool {
    true
}

/// What to print. Both flags default to on, the way stations are set up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeRenderRequest {
    pub holder_name: String,
    pub id: String,
    pub template_code: TemplateCode,
    /// Draw on a blank page of the template's size instead of its artwork.
    #[serde(default = "enabled")]
    pub use_blank_background: bool,
    /// Re-project the finished badge onto the larger fixed page.
    #[serde(default = "enabled")]
    pub fit_to_larger_page: bool,
}

/// Which font the name is set in.
///
/// Selection is kept apart from drawing: the badge service picks the
/// source, the renderer only consumes it.
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    /// A TrueType/OpenType font program to embed.
    Embedded(Bytes),
    /// The viewer-provided bold sans (Helvetica-Bold).
    BuiltIn,
}

impl FontSource {
    /// Any failure to obtain the display font degrades to the built-in font.
    pub fn select<E>(loaded: Result<Bytes, E>) -> FontSource {
        match loaded {
            Ok(bytes) if !bytes.is_empty() => FontSource::Embedded(bytes),
            _ => FontSource::BuiltIn,
        }
    }

    pub fn is_built_in(&self) -> bool {
        matches!(self, FontSource::BuiltIn)
    }
}

/// An 8-bit grayscale bitmap, row-major, 0 = black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl Raster {
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.luma.get((y * self.width + x) as usize).copied()
    }
}

/// The page the badge is drawn on.
#[derive(Debug, Clone, PartialEq)]
pub enum PageBase {
    /// A fresh empty page.
    Blank(PageSize),
    /// First page of the template's base document.
    Template { code: TemplateCode, document: Bytes },
}

/// Everything a renderer needs; all template geometry already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub base: PageBase,
    pub font: FontSource,
    pub font_size: f64,
    pub holder_name: String,
    pub name_field: NameField,
    pub code: Raster,
    pub code_field: CodeField,
    pub reproject_onto: Option<PageSize>,
}

/// Axis-aligned box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    /// Size of the single output page.
    pub page_size: PageSize,
    /// Where the composed badge sits on the output page.
    pub badge: Placement,
    /// Left x of the name and its measured width, in badge coordinates.
    pub name_origin_x: f64,
    pub name_width: f64,
    /// False when an embedded font was requested but could not be used.
    pub embedded_font_used: bool,
}

/// The printable artifact handed back to the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeArtifact {
    pub filename: String,
    pub template: TemplateCode,
    pub page_size: PageSize,
    pub bytes: Vec<u8>,
}

impl BadgeArtifact {
    pub const CONTENT_TYPE: &'static str = "application/pdf";
}
