//! Provider identity and per-call budgets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::request::CapabilityTier;

/// Default hard deadline for a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default minimum spacing between consecutive calls to one provider.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Identity and budgets of one registered provider.
///
/// Immutable once registered with a chain; adapters hand out references
/// and the orchestrator never rewrites a descriptor in place.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProviderDescriptor {
    /// Stable provider name, recorded in provenance and logs
    pub name: String,

    /// Capability tier the provider belongs to
    pub tier: CapabilityTier,

    /// Hard per-call deadline
    pub timeout: Duration,

    /// Minimum spacing between consecutive calls, enforced by the pacer
    pub min_interval: Duration,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, tier: CapabilityTier) -> Self {
        Self {
            name: name.into(),
            tier,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            min_interval: DEFAULT_MIN_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }
}
