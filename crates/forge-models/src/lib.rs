//! Shared data models for the mediaforge orchestrator.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests, payloads and capability tiers
//! - Generation results, artifacts and provenance
//! - Provider descriptors (identity, deadlines, pacing)
//! - Frame normalization and slideshow encoding configuration

pub mod encoding;
pub mod provider;
pub mod request;
pub mod result;

// Re-export common types
pub use encoding::SlideshowEncoding;
pub use provider::ProviderDescriptor;
pub use request::{
    CapabilityTier, GenerationPayload, GenerationRequest, ImageSpec, PayloadKind, RequestId,
    TextSpec, TierParseError, VideoSpec,
};
pub use result::{
    Artifact, GenerationResult, Provenance, ProvenanceReport, SYNTHETIC_PROVIDER,
};
