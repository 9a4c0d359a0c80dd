//! # Local asset store
//!
//! Local filesystem implementation of `AssetStore`.
//!
//! Layout under the asset root:
//!
//! ```text
//! template_TFFM.pdf   template_TFFM.png
//! template_TFF.pdf    template_TFF.png
//! template_TFM.pdf    template_TFM.png
//! BebasNeue-Regular.ttf
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{AssetStore, DomainError, Result, TemplateCode};
use tokio::fs;

pub const DEFAULT_FONT_FILE: &str = "BebasNeue-Regular.ttf";

pub struct LocalAssetStore {
    /// Root directory for all badge assets (e.g., "./public")
    root: PathBuf,
    font_file: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_font_file(root, DEFAULT_FONT_FILE)
    }

    pub fn with_font_file(root: impl Into<PathBuf>, font_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            font_file: font_file.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_path(&self, code: TemplateCode) -> PathBuf {
        self.root.join(format!("template_{code}.pdf"))
    }

    pub fn preview_path(&self, code: TemplateCode) -> PathBuf {
        self.root.join(format!("template_{code}.png"))
    }

    pub fn font_path(&self) -> PathBuf {
        self.root.join(&self.font_file)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn template_document(&self, code: TemplateCode) -> Result<Bytes> {
        let path = self.template_path(code);
        fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| DomainError::template(code, format!("{}: {e}", path.display())))
    }

    async fn template_preview(&self, code: TemplateCode) -> Result<Bytes> {
        let path = self.preview_path(code);
        fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| DomainError::template(code, format!("{}: {e}", path.display())))
    }

    async fn display_font(&self) -> Result<Bytes> {
        let path = self.font_path();
        fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| DomainError::FontLoad(format!("{}: {e}", path.display())))
    }
}
