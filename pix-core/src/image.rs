//! Decoding of the QR image returned by the provider.
//!
//! The image usually arrives as a `data:image/png;base64,` data url, but some responses carry the
//! bare base64 payload. Both forms are accepted.

use base64::{engine::general_purpose, Engine as _};

use crate::error::PixCoreError;

pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn decode_qr_image(data: &str) -> Result<Vec<u8>, PixCoreError> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| PixCoreError::InvalidDataUrl(truncate(data)))?;
            if !header.ends_with(";base64") {
                return Err(PixCoreError::InvalidDataUrl(truncate(data)));
            }
            payload
        }
        None => data,
    };

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(general_purpose::STANDARD.decode(payload.as_bytes())?)
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

fn truncate(data: &str) -> String {
    data.chars().take(32).collect()
}
