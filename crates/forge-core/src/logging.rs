//! Structured generation logging.
//!
//! Consistent, structured logging for the lifecycle of one `generate`
//! call, keyed by request ID, payload kind and tier.

use std::time::Duration;

use tracing::{info, warn, Span};

use forge_models::{CapabilityTier, PayloadKind, RequestId};

/// Logger for one generation request.
#[derive(Debug, Clone)]
pub struct GenerationLogger {
    request_id: String,
    kind: PayloadKind,
    tier: CapabilityTier,
}

impl GenerationLogger {
    pub fn new(request_id: &RequestId, kind: PayloadKind, tier: CapabilityTier) -> Self {
        Self {
            request_id: request_id.to_string(),
            kind,
            tier,
        }
    }

    /// Log the start of a generation.
    pub fn log_start(&self, chain_len: usize) {
        info!(
            request_id = %self.request_id,
            kind = self.kind.as_str(),
            tier = self.tier.as_str(),
            chain_len,
            "Generation started"
        );
    }

    /// Log that the chain was exhausted and degradation is taking over.
    pub fn log_degraded(&self, reason: &str) {
        warn!(
            request_id = %self.request_id,
            kind = self.kind.as_str(),
            tier = self.tier.as_str(),
            "Generation degrading to synthetic result: {}", reason
        );
    }

    /// Log a completed generation.
    pub fn log_completion(&self, provider: &str, elapsed: Duration) {
        info!(
            request_id = %self.request_id,
            kind = self.kind.as_str(),
            tier = self.tier.as_str(),
            provider,
            elapsed_ms = elapsed.as_millis() as u64,
            "Generation completed"
        );
    }

    /// Create a tracing span for this generation.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "generate",
            request_id = %self.request_id,
            kind = self.kind.as_str(),
            tier = self.tier.as_str()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_creation() {
        let id = RequestId::new();
        let logger = GenerationLogger::new(&id, PayloadKind::Image, CapabilityTier::Fast);
        assert_eq!(logger.request_id, id.to_string());
    }
}
