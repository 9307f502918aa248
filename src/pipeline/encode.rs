//! Image encoding: `DynamicImage` → base64 PNG.
//!
//! Chat-completions APIs accept images as base64 data URIs embedded in the
//! JSON request body. PNG is lossless; JPEG artefacts around glyph edges hurt
//! recognition at 1024 px.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// MIME type of every encoded page.
pub const PAGE_IMAGE_MIME: &str = "image/png";

/// Encode a rasterised page as base64 PNG (no data-URI prefix).
pub fn encode_page(img: &DynamicImage) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(b64)
}

/// Wrap base64 PNG data in a `data:` URI.
pub fn data_url(b64: &str) -> String {
    format!("data:{PAGE_IMAGE_MIME};base64,{b64}")
}
