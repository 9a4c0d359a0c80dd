//! # Badge Service
//!
//! Orchestrates one print: resolves the template, gathers assets, encodes
//! the identifier and hands a complete [`RenderPlan`] to the renderer.
//!
//! # Developer Note
//! Geometry is static per template while the name origin is measured per
//! request, so the plan carries the field boxes and the renderer does the
//! measuring. Re-projection happens after composition, leaving the
//! template-relative coordinates untouched.

use std::sync::Arc;

use domains::layout::badge_filename;
use domains::{
    AssetStore, BadgeArtifact, BadgeRenderRequest, CodeEncoder, DocumentRenderer, DomainError,
    FontSource, PageBase, PageSize, RenderPlan, Result,
};
use tracing::{info, warn};

/// Print settings shared by every badge.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeSettings {
    pub font_size: f64,
    /// Raster pixels per rendered point of the code field.
    pub code_oversample: u32,
    /// Quiet zone around the code, in modules.
    pub quiet_zone: u32,
    pub larger_page: PageSize,
}

impl Default for BadgeSettings {
    fn default() -> Self {
        Self {
            font_size: 24.0,
            code_oversample: 2,
            quiet_zone: 1,
            larger_page: PageSize::A4,
        }
    }
}

pub struct BadgeService {
    assets: Arc<dyn AssetStore>,
    encoder: Arc<dyn CodeEncoder>,
    renderer: Arc<dyn DocumentRenderer>,
    settings: BadgeSettings,
}

impl BadgeService {
    pub fn new(
        assets: Arc<dyn AssetStore>,
        encoder: Arc<dyn CodeEncoder>,
        renderer: Arc<dyn DocumentRenderer>,
        settings: BadgeSettings,
    ) -> Self {
        Self {
            assets,
            encoder,
            renderer,
            settings,
        }
    }

    pub fn settings(&self) -> &BadgeSettings {
        &self.settings
    }

    /// Composes one badge document.
    ///
    /// Fails with `TemplateLoad` when the artwork is needed and missing, and
    /// with `Encoding` when the id does not fit a barcode. A missing display
    /// font never fails the request.
    pub async fn compose(&self, request: &BadgeRenderRequest) -> Result<BadgeArtifact> {
        if request.id.trim().is_empty() {
            return Err(DomainError::Validation("badge ID is required".to_string()));
        }
        let variant = request.template_code.variant();

        // 1. Page: blank at template size, or the template's own document
        let base = if request.use_blank_background {
            PageBase::Blank(variant.page_size)
        } else {
            let document = self.assets.template_document(variant.code).await?;
            PageBase::Template {
                code: variant.code,
                document,
            }
        };

        // 2. Font: display font when available, built-in otherwise
        let font = self.select_font().await;

        // 3. Code: oversampled so it stays sharp when scaled into the field
        let target_px = (variant.code_field.size * f64::from(self.settings.code_oversample)).round() as u32;
        let code = self
            .encoder
            .encode(&request.id, target_px, self.settings.quiet_zone)?;

        // 4. Render, re-projecting onto the larger page if asked
        let plan = RenderPlan {
            base,
            font,
            font_size: self.settings.font_size,
            holder_name: request.holder_name.clone(),
            name_field: variant.name_field,
            code,
            code_field: variant.code_field,
            reproject_onto: request
                .fit_to_larger_page
                .then_some(self.settings.larger_page),
        };
        let rendered = self.renderer.render(&plan)?;

        info!(
            template = %variant.code,
            id = %request.id,
            blank = request.use_blank_background,
            fit_to_larger_page = request.fit_to_larger_page,
            embedded_font = rendered.embedded_font_used,
            bytes = rendered.bytes.len(),
            "badge composed"
        );

        Ok(BadgeArtifact {
            filename: badge_filename(&request.holder_name),
            template: variant.code,
            page_size: rendered.page_size,
            bytes: rendered.bytes,
        })
    }

    async fn select_font(&self) -> FontSource {
        let loaded = self.assets.display_font().await;
        if let Err(e) = &loaded {
            warn!(error = %e, "display font unavailable, using built-in bold sans");
        }
        FontSource::select(loaded)
    }
}
