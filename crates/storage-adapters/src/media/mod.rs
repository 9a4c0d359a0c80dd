//! # Media
//!
//! Barcode rasterization and PDF composition for badges.

mod font;
mod pdf;
mod qr;

pub use font::{encode_win_ansi, PdfFont};
pub use pdf::PdfRenderer;
pub use qr::QrCodeEncoder;
