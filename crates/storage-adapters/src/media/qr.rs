use domains::{CodeEncoder, DomainError, Raster, Result};
use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};

const DARK: u8 = 0;
const LIGHT: u8 = 255;

/// QR code encoder producing square grayscale rasters.
///
/// Modules are mapped onto pixels by nearest-neighbour sampling, so the
/// output depends only on the payload, the target side and the quiet zone.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeEncoder {
    ec_level: EcLevel,
}

impl QrCodeEncoder {
    pub fn new() -> Self {
        Self {
            ec_level: EcLevel::M,
        }
    }
}

impl Default for QrCodeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeEncoder for QrCodeEncoder {
    fn encode(&self, payload: &str, target_px: u32, quiet_zone: u32) -> Result<Raster> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), self.ec_level)
            .map_err(|e| DomainError::Encoding(format!("cannot encode {payload:?}: {e}")))?;

        let modules = code.width() as u64;
        let span = modules + 2 * u64::from(quiet_zone);
        // Never fewer pixels than modules.
        let side = u64::from(target_px).max(span);
        let quiet = u64::from(quiet_zone);

        let module_at = |px: u32| -> Option<usize> {
            let m = u64::from(px) * span / side;
            (m >= quiet && m < quiet + modules).then(|| (m - quiet) as usize)
        };

        let image = GrayImage::from_fn(side as u32, side as u32, |x, y| {
            let dark = match (module_at(x), module_at(y)) {
                (Some(mx), Some(my)) => code[(mx, my)] == Color::Dark,
                _ => false,
            };
            Luma([if dark { DARK } else { LIGHT }])
        });

        Ok(Raster {
            width: image.width(),
            height: image.height(),
            luma: image.into_raw(),
        })
    }
}
