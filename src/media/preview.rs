/// Preview images for APOD entries
///
/// Downloads the entry's image, decodes it and downsizes it for the card
/// grid. Decoding and resizing are CPU-bound and run on the blocking pool.
/// Previews live in memory only.
use image::imageops::FilterType;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Maximum preview width in pixels (height follows the aspect ratio)
pub const PREVIEW_WIDTH: u32 = 384;

/// Decoded RGBA preview ready for display
#[derive(Clone, PartialEq, Eq)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

// Pixel buffers are large; keep them out of debug output
impl std::fmt::Debug for Preview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preview")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    #[error("preview download failed: {0}")]
    Download(String),

    #[error("preview could not be decoded: {0}")]
    Decode(String),
}

/// Download `url` and turn it into a display-sized preview
pub async fn fetch_preview(client: Client, url: String) -> Result<Preview, PreviewError> {
    let response = client
        .get(&url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| PreviewError::Download(e.to_string()))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| PreviewError::Download(e.to_string()))?;

    debug!("Downloaded {}KB preview source from {}", bytes.len() / 1024, url);

    // Spawn blocking because decoding and resizing are CPU-intensive
    tokio::task::spawn_blocking(move || decode_preview(&bytes))
        .await
        .map_err(|e| PreviewError::Decode(format!("task join error: {}", e)))?
}

/// Decode image bytes (any format the `image` crate knows) into a preview
pub fn decode_preview(bytes: &[u8]) -> Result<Preview, PreviewError> {
    let img = image::load_from_memory(bytes).map_err(|e| PreviewError::Decode(e.to_string()))?;

    // Only shrink; small images are shown as-is
    let img = if img.width() > PREVIEW_WIDTH {
        // Resize maintaining aspect ratio (width-constrained)
        img.resize(PREVIEW_WIDTH, PREVIEW_WIDTH * 10, FilterType::Lanczos3)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    Ok(Preview {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}
