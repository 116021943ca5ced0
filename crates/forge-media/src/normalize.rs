//! Source frame normalization.
//!
//! Slideshow inputs arrive from arbitrary providers: mixed formats, mixed
//! color models, sometimes corrupt bytes. Everything is decoded, fitted
//! onto one canvas and re-encoded as RGB JPEG at a fixed quality before
//! FFmpeg ever sees it. Unusable inputs are rejected with a reason, never
//! passed through raw.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::GenericImageView;
use serde::Serialize;
use tracing::{debug, warn};

use forge_models::encoding::{
    CANVAS_HEIGHT, CANVAS_WIDTH, FRAME_JPEG_QUALITY, MIN_FRAME_EDGE, MIN_IMAGE_BYTES,
};

use crate::error::{MediaError, MediaResult};

/// A source frame that did not survive normalization.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedFrame {
    pub source: PathBuf,
    pub reason: String,
}

/// Result of normalizing a set of source frames.
#[derive(Debug)]
pub struct NormalizedFrames {
    /// Canonical frames written under the workdir, in input order
    pub frames: Vec<PathBuf>,
    /// Inputs that were rejected, with reasons
    pub rejected: Vec<RejectedFrame>,
}

/// Normalize source images into canonical JPEG frames under `workdir`.
///
/// Returns an error only when zero inputs survive; partial rejection is
/// reported through [`NormalizedFrames::rejected`].
pub async fn normalize_frames(
    sources: &[PathBuf],
    workdir: &Path,
) -> MediaResult<NormalizedFrames> {
    let mut frames = Vec::new();
    let mut rejected = Vec::new();

    for source in sources {
        let bytes = match tokio::fs::read(source).await {
            Ok(bytes) => bytes,
            Err(e) => {
                rejected.push(RejectedFrame {
                    source: source.clone(),
                    reason: format!("unreadable: {}", e),
                });
                continue;
            }
        };

        let encoded = tokio::task::spawn_blocking(move || normalize_one(&bytes))
            .await
            .map_err(|e| MediaError::internal(format!("normalize task panicked: {}", e)))?;

        match encoded {
            Ok(jpeg) => {
                let dst = workdir.join(format!("frame_{:03}.jpg", frames.len()));
                tokio::fs::write(&dst, jpeg).await?;
                frames.push(dst);
            }
            Err(reason) => {
                warn!(source = %source.display(), %reason, "Rejecting source frame");
                rejected.push(RejectedFrame {
                    source: source.clone(),
                    reason,
                });
            }
        }
    }

    if frames.is_empty() {
        return Err(MediaError::NoUsableFrames);
    }

    debug!(
        accepted = frames.len(),
        rejected = rejected.len(),
        "Frame normalization complete"
    );

    Ok(NormalizedFrames { frames, rejected })
}

/// Decode, bound and re-encode one source image.
///
/// Returns the canonical JPEG bytes, or a rejection reason.
fn normalize_one(bytes: &[u8]) -> Result<Vec<u8>, String> {
    if (bytes.len() as u64) < MIN_IMAGE_BYTES {
        return Err(format!("file too small: {} bytes", bytes.len()));
    }

    let img = image::load_from_memory(bytes).map_err(|e| format!("decode failed: {}", e))?;

    let (w, h) = (img.width(), img.height());
    if w < MIN_FRAME_EDGE || h < MIN_FRAME_EDGE {
        return Err(format!("frame too small: {}x{}", w, h));
    }

    // Fill the canvas, cropping overflow; every output frame shares one
    // resolution so the concat demuxer never sees a size change.
    let canvas = img
        .resize_to_fill(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Lanczos3)
        .to_rgb8();

    let mut jpeg = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, FRAME_JPEG_QUALITY);
    encoder
        .encode_image(&canvas)
        .map_err(|e| format!("re-encode failed: {}", e))?;

    Ok(jpeg)
}
