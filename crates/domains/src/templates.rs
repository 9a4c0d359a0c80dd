//! # Templates
//!
//! The closed set of physical badge layouts. Geometry is static: it is
//! fixed per template and never depends on the name being printed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Width × height in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4, the larger page badges are re-projected onto.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Where the holder name goes: a horizontal span and a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NameField {
    pub x: f64,
    pub width: f64,
    pub baseline_y: f64,
}

impl NameField {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Where the encoded identifier goes: lower-left corner and square side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodeField {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

/// Template identifier. Serialized as its upper-case code (`"TFFM"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateCode {
    #[serde(rename = "TFFM")]
    Tffm,
    #[serde(rename = "TFF")]
    Tff,
    #[serde(rename = "TFM")]
    Tfm,
}

impl TemplateCode {
    pub const ALL: [TemplateCode; 3] = [TemplateCode::Tffm, TemplateCode::Tff, TemplateCode::Tfm];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCode::Tffm => "TFFM",
            TemplateCode::Tff => "TFF",
            TemplateCode::Tfm => "TFM",
        }
    }

    /// Maps a directory badge category onto a template.
    ///
    /// Case-insensitive substring checks, in order: "tff badge", "tfm badge",
    /// "tffm". Anything else, including a missing category, prints on TFFM.
    pub fn from_badge_category(category: Option<&str>) -> TemplateCode {
        let Some(category) = category else {
            return TemplateCode::Tffm;
        };
        let lower = category.to_lowercase();

        if lower.contains("tff badge") {
            TemplateCode::Tff
        } else if lower.contains("tfm badge") {
            TemplateCode::Tfm
        } else {
            TemplateCode::Tffm
        }
    }

    pub fn variant(&self) -> &'static TemplateVariant {
        match self {
            TemplateCode::Tffm => &CATALOG[0],
            TemplateCode::Tff => &CATALOG[1],
            TemplateCode::Tfm => &CATALOG[2],
        }
    }
}

impl fmt::Display for TemplateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateCode::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownTemplate(s.to_string()))
    }
}

/// One physical badge layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariant {
    pub code: TemplateCode,
    pub page_size: PageSize,
    pub name_field: NameField,
    pub code_field: CodeField,
    /// Accent color of the printed stock, display only.
    pub color_label: &'static str,
}

// All three stocks share one die-cut, only the artwork differs.
const BADGE_PAGE: PageSize = PageSize::new(288.0, 432.0);
const BADGE_NAME_FIELD: NameField = NameField {
    x: 33.84,
    width: 220.32,
    baseline_y: 233.0,
};
const BADGE_CODE_FIELD: CodeField = CodeField {
    x: 120.0,
    y: 160.0,
    size: 50.0,
};

static CATALOG: [TemplateVariant; 3] = [
    TemplateVariant {
        code: TemplateCode::Tffm,
        page_size: BADGE_PAGE,
        name_field: BADGE_NAME_FIELD,
        code_field: BADGE_CODE_FIELD,
        color_label: "Yellow",
    },
    TemplateVariant {
        code: TemplateCode::Tff,
        page_size: BADGE_PAGE,
        name_field: BADGE_NAME_FIELD,
        code_field: BADGE_CODE_FIELD,
        color_label: "Pink",
    },
    TemplateVariant {
        code: TemplateCode::Tfm,
        page_size: BADGE_PAGE,
        name_field: BADGE_NAME_FIELD,
        code_field: BADGE_CODE_FIELD,
        color_label: "Blue",
    },
];

/// Every template, in catalog order.
pub fn catalog() -> &'static [TemplateVariant] {
    &CATALOG
}
