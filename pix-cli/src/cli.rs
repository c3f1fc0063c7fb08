use std::{
    fs,
    path::{Path, PathBuf},
};

use pix_core::{image::decode_qr_image, primitives::PixChargeResponse};
use qrcode::{render::unicode, QrCode};

pub const PIX_CODE_FILE: &str = "pix_copia_e_cola.txt";
pub const PIX_IMAGE_FILE: &str = "pix.png";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SavedFiles {
    pub code: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

/// Writes the copy-paste code and the decoded QR image of a charge into `out_dir`.
/// Files are only written for the fields the provider returned.
pub fn save_charge_files(
    charge: &PixChargeResponse,
    out_dir: &Path,
) -> anyhow::Result<SavedFiles> {
    fs::create_dir_all(out_dir)?;
    let mut saved = SavedFiles::default();

    if let Some(ref code) = charge.qr_code {
        let path = out_dir.join(PIX_CODE_FILE);
        fs::write(&path, code)?;
        saved.code = Some(path);
    }

    if let Some(ref image) = charge.qr_code_base64 {
        let path = out_dir.join(PIX_IMAGE_FILE);
        fs::write(&path, decode_qr_image(image)?)?;
        saved.image = Some(path);
    }

    Ok(saved)
}

pub fn render_qr(code: &str) -> anyhow::Result<String> {
    Ok(QrCode::new(code)?
        .render::<unicode::Dense1x2>()
        .quiet_zone(true)
        .build())
}
