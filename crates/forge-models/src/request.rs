//! Generation requests, payloads and capability tiers.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new random request ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quality/speed class a request is routed to.
///
/// Each tier maps to an ordered provider chain; order inside a chain is
/// the authoritative fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTier {
    /// Cheapest providers first, lowest latency
    #[default]
    Fast,
    /// Best output first, latency secondary
    Quality,
}

impl CapabilityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityTier::Fast => "fast",
            CapabilityTier::Quality => "quality",
        }
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a capability tier from a string.
#[derive(Debug, Error)]
#[error("unknown capability tier: {0}")]
pub struct TierParseError(pub String);

impl FromStr for CapabilityTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(CapabilityTier::Fast),
            "quality" => Ok(CapabilityTier::Quality),
            other => Err(TierParseError(other.to_string())),
        }
    }
}

/// The kind of artifact a payload asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Text,
    Image,
    Video,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Text => "text",
            PayloadKind::Image => "image",
            PayloadKind::Video => "video",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a text completion request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TextSpec {
    pub prompt: String,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

/// Parameters for an image synthesis request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImageSpec {
    pub prompt: String,

    #[serde(default = "default_image_edge")]
    pub width: u32,

    #[serde(default = "default_image_edge")]
    pub height: u32,
}

fn default_image_edge() -> u32 {
    1024
}

/// Parameters for a video assembly request.
///
/// Frames are arbitrarily-sourced image files; the assembly pipeline
/// normalizes them before the external process ever sees them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoSpec {
    /// Optional title, used for output naming and synthetic fallbacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Source image files, in display order
    pub frames: Vec<PathBuf>,

    /// Seconds each frame is held on screen
    #[serde(default = "default_frame_secs")]
    pub frame_secs: f64,
}

fn default_frame_secs() -> f64 {
    crate::encoding::DEFAULT_FRAME_SECS
}

/// Opaque generation payload, tagged by artifact kind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationPayload {
    Text(TextSpec),
    Image(ImageSpec),
    Video(VideoSpec),
}

impl GenerationPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            GenerationPayload::Text(_) => PayloadKind::Text,
            GenerationPayload::Image(_) => PayloadKind::Image,
            GenerationPayload::Video(_) => PayloadKind::Video,
        }
    }

    pub fn as_text(&self) -> Option<&TextSpec> {
        match self {
            GenerationPayload::Text(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageSpec> {
        match self {
            GenerationPayload::Image(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoSpec> {
        match self {
            GenerationPayload::Video(spec) => Some(spec),
            _ => None,
        }
    }

    /// Prompt text, where the payload carries one.
    pub fn prompt(&self) -> Option<&str> {
        match self {
            GenerationPayload::Text(spec) => Some(&spec.prompt),
            GenerationPayload::Image(spec) => Some(&spec.prompt),
            GenerationPayload::Video(spec) => spec.title.as_deref(),
        }
    }
}

/// A request handed to the orchestrator.
///
/// Never mutated after creation; passed by reference through the chain.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRequest {
    /// Unique request ID
    pub id: RequestId,

    /// Capability tier selecting the provider chain
    #[serde(default)]
    pub tier: CapabilityTier,

    /// What to generate
    pub payload: GenerationPayload,

    /// Overrides every provider's declared per-call deadline for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_override: Option<Duration>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl GenerationRequest {
    /// Create a text generation request.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self::new(GenerationPayload::Text(TextSpec {
            prompt: prompt.into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }))
    }

    /// Create an image generation request.
    pub fn image(prompt: impl Into<String>, width: u32, height: u32) -> Self {
        Self::new(GenerationPayload::Image(ImageSpec {
            prompt: prompt.into(),
            width,
            height,
        }))
    }

    /// Create a video assembly request from source frames.
    pub fn video(title: Option<String>, frames: Vec<PathBuf>) -> Self {
        Self::new(GenerationPayload::Video(VideoSpec {
            title,
            frames,
            frame_secs: default_frame_secs(),
        }))
    }

    fn new(payload: GenerationPayload) -> Self {
        Self {
            id: RequestId::new(),
            tier: CapabilityTier::default(),
            payload,
            deadline_override: None,
            created_at: Utc::now(),
        }
    }

    /// Route the request to a specific tier.
    pub fn with_tier(mut self, tier: CapabilityTier) -> Self {
        self.tier = tier;
        self
    }

    /// Cap every provider call at `deadline` instead of each provider's own budget.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_override = Some(deadline);
        self
    }

    pub fn kind(&self) -> PayloadKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_round_trip() {
        assert_eq!("fast".parse::<CapabilityTier>().unwrap(), CapabilityTier::Fast);
        assert_eq!(
            "Quality".parse::<CapabilityTier>().unwrap(),
            CapabilityTier::Quality
        );
        assert!("premium".parse::<CapabilityTier>().is_err());
    }

    #[test]
    fn test_request_construction() {
        let req = GenerationRequest::text("a haiku about caching")
            .with_tier(CapabilityTier::Quality)
            .with_deadline(Duration::from_secs(5));

        assert_eq!(req.kind(), PayloadKind::Text);
        assert_eq!(req.tier, CapabilityTier::Quality);
        assert_eq!(req.deadline_override, Some(Duration::from_secs(5)));
        assert_eq!(req.payload.prompt(), Some("a haiku about caching"));
    }

    #[test]
    fn test_payload_serde_tagging() {
        let req = GenerationRequest::image("sunset", 512, 512);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["payload"]["kind"], "image");
        assert_eq!(json["payload"]["width"], 512);
    }

    #[test]
    fn test_video_defaults() {
        let json = serde_json::json!({
            "kind": "video",
            "frames": ["/tmp/a.png", "/tmp/b.png"],
        });
        let payload: GenerationPayload = serde_json::from_value(json).unwrap();
        let spec = payload.as_video().unwrap();
        assert_eq!(spec.frames.len(), 2);
        assert!((spec.frame_secs - crate::encoding::DEFAULT_FRAME_SECS).abs() < f64::EPSILON);
    }
}
