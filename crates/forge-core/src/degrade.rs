//! Synthetic degradation.
//!
//! When every real provider fails, a best-effort pipeline still owes the
//! caller a result: templated text, a solid-color placeholder image, or a
//! solid-color poster for video requests. Provenance marks these as
//! synthetic so callers warn the user instead of presenting them as a
//! genuine provider result.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::time::Instant;

use image::{ImageOutputFormat, Rgb, RgbImage};
use tracing::{error, info};

use forge_models::encoding::PLACEHOLDER_EDGE;
use forge_models::{
    Artifact, GenerationPayload, GenerationRequest, GenerationResult, Provenance,
};

/// Produces a clearly-labeled synthetic result for any request.
#[derive(Debug, Clone)]
pub struct DegradationPolicy {
    /// Longest edge of synthesized placeholder images
    placeholder_edge: u32,
}

impl Default for DegradationPolicy {
    fn default() -> Self {
        Self {
            placeholder_edge: PLACEHOLDER_EDGE,
        }
    }
}

impl DegradationPolicy {
    pub fn new(placeholder_edge: u32) -> Self {
        Self { placeholder_edge }
    }

    /// Synthesize a result for the request.
    ///
    /// Always returns a `Success` with `synthetic = true`, except in the
    /// exceedingly rare case that synthesis itself fails (image encoding),
    /// which is the only hard `Failure` the orchestrator can emit.
    pub fn synthesize(
        &self,
        request: &GenerationRequest,
        detail: String,
        started: Instant,
    ) -> GenerationResult {
        let artifact = match &request.payload {
            GenerationPayload::Text(spec) => Ok(synthesize_text(&spec.prompt)),
            GenerationPayload::Image(spec) => {
                self.synthesize_image(&spec.prompt, spec.width, spec.height)
            }
            GenerationPayload::Video(spec) => {
                // Real assembly needs a working FFmpeg, which may be part of
                // why the chain failed; a poster frame always works.
                let label = spec.title.as_deref().unwrap_or("slideshow");
                self.synthesize_image(label, self.placeholder_edge, self.placeholder_edge)
            }
        };

        match artifact {
            Ok(artifact) => {
                info!(
                    request_id = %request.id,
                    kind = request.kind().as_str(),
                    "Degraded to synthetic result: {}", detail
                );
                GenerationResult::success(artifact, Provenance::degraded(started.elapsed(), detail))
            }
            Err(e) => {
                error!(request_id = %request.id, "Degradation itself failed: {}", e);
                GenerationResult::failure(
                    format!("{}; degradation failed: {}", detail, e),
                    started.elapsed(),
                )
            }
        }
    }

    fn synthesize_image(&self, prompt: &str, width: u32, height: u32) -> Result<Artifact, String> {
        let width = width.clamp(16, self.placeholder_edge);
        let height = height.clamp(16, self.placeholder_edge);

        let img = RgbImage::from_pixel(width, height, Rgb(color_for_prompt(prompt)));
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(|e| e.to_string())?;

        Ok(Artifact::bytes(png, "image/png"))
    }
}

/// Templated text assembled from the request's own parameters.
fn synthesize_text(prompt: &str) -> Artifact {
    let topic: String = prompt.trim().chars().take(120).collect();
    Artifact::text(format!(
        "{}\n\n(placeholder text: no generation provider was available)",
        topic
    ))
}

/// Stable color derived from the prompt, so repeated degraded calls are
/// reproducible.
fn color_for_prompt(prompt: &str) -> [u8; 3] {
    let mut hasher = DefaultHasher::new();
    prompt.hash(&mut hasher);
    let h = hasher.finish();
    // Keep channels away from pure black so the placeholder is visibly a
    // deliberate card, not a decode bug.
    [
        64 + (h & 0x7F) as u8,
        64 + ((h >> 8) & 0x7F) as u8,
        64 + ((h >> 16) & 0x7F) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_text_degradation_is_synthetic_and_labeled() {
        let policy = DegradationPolicy::default();
        let request = GenerationRequest::text("launch announcement for the new feature");

        let result = policy.synthesize(&request, "all providers exhausted".into(), Instant::now());

        assert!(result.is_success());
        assert!(result.is_synthetic());
        match result.artifact().unwrap() {
            Artifact::Text { content } => {
                assert!(content.contains("launch announcement"));
                assert!(content.contains("placeholder"));
            }
            other => panic!("expected text artifact, got {other:?}"),
        }
    }

    #[test]
    fn test_image_degradation_produces_png() {
        let policy = DegradationPolicy::default();
        let request = GenerationRequest::image("a red fox", 512, 512);

        let result = policy.synthesize(&request, "exhausted".into(), Instant::now());
        let artifact = result.artifact().unwrap();

        match artifact {
            Artifact::Bytes { data, content_type } => {
                assert_eq!(content_type, "image/png");
                let img = image::load_from_memory(data).unwrap();
                assert_eq!((img.width(), img.height()), (512, 512));
            }
            other => panic!("expected bytes artifact, got {other:?}"),
        }
    }

    #[test]
    fn test_video_degradation_is_a_poster_frame() {
        let policy = DegradationPolicy::default();
        let request = GenerationRequest::video(Some("demo".into()), vec!["/nope.png".into()]);

        let result = policy.synthesize(&request, "exhausted".into(), Instant::now());
        assert!(result.is_synthetic());
        assert!(matches!(
            result.artifact().unwrap(),
            Artifact::Bytes { content_type, .. } if content_type == "image/png"
        ));
    }

    #[test]
    fn test_placeholder_color_is_deterministic() {
        assert_eq!(color_for_prompt("a red fox"), color_for_prompt("a red fox"));
        assert_ne!(color_for_prompt("a red fox"), color_for_prompt("a blue owl"));
    }

    #[test]
    fn test_oversized_request_is_clamped() {
        let policy = DegradationPolicy::default();
        let request = GenerationRequest::image("big", 8192, 8192);

        let result = policy.synthesize(&request, "exhausted".into(), Instant::now());
        match result.artifact().unwrap() {
            Artifact::Bytes { data, .. } => {
                let img = image::load_from_memory(data).unwrap();
                assert_eq!(img.width(), PLACEHOLDER_EDGE);
            }
            other => panic!("expected bytes artifact, got {other:?}"),
        }
    }
}
