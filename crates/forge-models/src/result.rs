//! Generation outcomes, artifacts and provenance.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Provider name recorded when the degradation policy produced the result.
pub const SYNTHETIC_PROVIDER: &str = "synthetic";

/// A produced artifact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
    /// Generated text
    Text { content: String },
    /// In-memory binary blob (images)
    Bytes { data: Vec<u8>, content_type: String },
    /// Artifact on disk (videos are relocated out of the job workdir first)
    File { path: PathBuf },
}

impl Artifact {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn bytes(data: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self::Bytes {
            data,
            content_type: content_type.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Payload size in bytes, where it is known without touching the filesystem.
    pub fn len(&self) -> Option<usize> {
        match self {
            Artifact::Text { content } => Some(content.len()),
            Artifact::Bytes { data, .. } => Some(data.len()),
            Artifact::File { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

/// Which provider satisfied a request, and how long it took.
///
/// Always retained for success results; thin UI layers render this to
/// end users so degraded results can be labeled as such.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Provenance {
    /// Name of the provider that produced the artifact
    pub provider: String,

    /// True when the degradation policy synthesized the artifact
    pub synthetic: bool,

    /// Wall-clock time spent on the whole `generate` call
    pub elapsed: Duration,

    /// Human-readable note, e.g. why the chain was exhausted before degrading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Provenance {
    /// Provenance for a genuine provider result.
    pub fn from_provider(provider: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            provider: provider.into(),
            synthetic: false,
            elapsed,
            detail: None,
        }
    }

    /// Provenance for a degraded, synthesized result.
    pub fn degraded(elapsed: Duration, detail: impl Into<String>) -> Self {
        Self {
            provider: SYNTHETIC_PROVIDER.to_string(),
            synthetic: true,
            elapsed,
            detail: Some(detail.into()),
        }
    }
}

/// Tagged outcome of a `generate` call.
///
/// The orchestrator's top-level contract guarantees a result is always
/// returned; a `Failure` only occurs when even the degradation policy
/// could not run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GenerationResult {
    Success {
        artifact: Artifact,
        provenance: Provenance,
    },
    Failure {
        error: String,
        elapsed: Duration,
    },
}

impl GenerationResult {
    pub fn success(artifact: Artifact, provenance: Provenance) -> Self {
        Self::Success {
            artifact,
            provenance,
        }
    }

    pub fn failure(error: impl Into<String>, elapsed: Duration) -> Self {
        Self::Failure {
            error: error.into(),
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        match self {
            GenerationResult::Success { provenance, .. } => Some(provenance),
            GenerationResult::Failure { .. } => None,
        }
    }

    /// Name of the provider that satisfied the request, if any did.
    pub fn provider_used(&self) -> Option<&str> {
        self.provenance().map(|p| p.provider.as_str())
    }

    pub fn is_synthetic(&self) -> bool {
        self.provenance().map(|p| p.synthetic).unwrap_or(false)
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            GenerationResult::Success { artifact, .. } => Some(artifact),
            GenerationResult::Failure { .. } => None,
        }
    }

    /// Flatten into the wire-facing report callers render to users.
    pub fn report(&self) -> ProvenanceReport {
        match self {
            GenerationResult::Success {
                provenance: p, ..
            } => ProvenanceReport {
                success: true,
                provider_used: p.provider.clone(),
                synthetic: p.synthetic,
                elapsed_ms: p.elapsed.as_millis() as u64,
                error: p.detail.clone(),
            },
            GenerationResult::Failure { error, elapsed } => ProvenanceReport {
                success: false,
                provider_used: String::new(),
                synthetic: false,
                elapsed_ms: elapsed.as_millis() as u64,
                error: Some(error.clone()),
            },
        }
    }
}

/// Flat provenance contract for UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProvenanceReport {
    pub success: bool,
    pub provider_used: String,
    pub synthetic: bool,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
