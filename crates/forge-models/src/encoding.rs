//! Frame normalization and slideshow encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "medium";
/// Default CRF (Constant Rate Factor) for slideshow output
pub const DEFAULT_CRF: u8 = 23;
/// Pixel format required for broad player compatibility
pub const DEFAULT_PIX_FMT: &str = "yuv420p";

/// Canvas every normalized frame is fitted onto
pub const CANVAS_WIDTH: u32 = 1280;
pub const CANVAS_HEIGHT: u32 = 720;

/// Longest edge a normalized frame may have
pub const MAX_FRAME_EDGE: u32 = 1920;
/// Shortest edge a frame must have to be usable
pub const MIN_FRAME_EDGE: u32 = 64;
/// JPEG quality every normalized frame is re-encoded at
pub const FRAME_JPEG_QUALITY: u8 = 90;

/// Smallest HTTP image body accepted as a real image.
/// A 200 response with fewer bytes than this is a validation failure.
pub const MIN_IMAGE_BYTES: u64 = 64;
/// Smallest output file accepted as a real video
pub const MIN_VIDEO_BYTES: u64 = 4096;

/// Seconds each frame is held on screen by default
pub const DEFAULT_FRAME_SECS: f64 = 3.0;
/// Edge length of synthesized placeholder images
pub const PLACEHOLDER_EDGE: u32 = 720;

/// Slideshow encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SlideshowEncoding {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "fast", "medium", "slow")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Pixel format
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,

    /// Move the moov atom up front for streaming playback
    #[serde(default = "default_faststart")]
    pub faststart: bool,
}

fn default_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_pix_fmt() -> String {
    DEFAULT_PIX_FMT.to_string()
}
fn default_faststart() -> bool {
    true
}

impl Default for SlideshowEncoding {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            preset: default_preset(),
            crf: default_crf(),
            pix_fmt: default_pix_fmt(),
            faststart: default_faststart(),
        }
    }
}

impl SlideshowEncoding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new config with updated CRF.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf;
        self
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pix_fmt.clone(),
        ];

        if self.faststart {
            args.extend_from_slice(&["-movflags".to_string(), "+faststart".to_string()]);
        }

        args
    }
}
