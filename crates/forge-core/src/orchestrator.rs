//! The orchestrator: one call, always a result.
//!
//! Resolves a request's (payload kind, tier) to a fallback chain, runs it
//! behind the shared pacer, and degrades to a synthetic result when the
//! chain is exhausted. Constructed explicitly by the caller and passed
//! where needed; there is no global instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::error;

use forge_models::{
    CapabilityTier, GenerationRequest, GenerationResult, PayloadKind, Provenance,
};
use forge_providers::ProviderAdapter;

use crate::chain::FallbackChain;
use crate::config::OrchestratorConfig;
use crate::degrade::DegradationPolicy;
use crate::error::{CoreError, CoreResult};
use crate::logging::GenerationLogger;
use crate::pacing::ProviderPacer;

/// Routing key: what is being generated, at which tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainKey {
    pub kind: PayloadKind,
    pub tier: CapabilityTier,
}

/// Composes pacing, fallback chains and degradation into one call.
pub struct Orchestrator {
    chains: HashMap<ChainKey, FallbackChain>,
    pacer: ProviderPacer,
    degradation: DegradationPolicy,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("chains", &self.chains.keys().collect::<Vec<_>>())
            .field("degradation", &self.degradation)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Generate an artifact for the request.
    ///
    /// Never returns an error: a genuine result, a synthetic result and
    /// the (rare) hard failure are all carried in the returned data.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let started = Instant::now();
        let key = ChainKey {
            kind: request.kind(),
            tier: request.tier,
        };
        let logger = GenerationLogger::new(&request.id, key.kind, key.tier);

        let Some(chain) = self.chains.get(&key) else {
            // Caller misconfiguration, but the no-raise contract still
            // holds: degrade and record the miss in provenance.
            error!(
                request_id = %request.id,
                kind = key.kind.as_str(),
                tier = key.tier.as_str(),
                "No provider chain registered"
            );
            return self.degradation.synthesize(
                request,
                format!(
                    "no provider chain registered for {}/{}",
                    key.kind, key.tier
                ),
                started,
            );
        };

        logger.log_start(chain.len());

        match chain.run(request, &self.pacer).await {
            Ok(success) => {
                logger.log_completion(&success.provider, success.elapsed);
                GenerationResult::success(
                    success.artifact,
                    Provenance::from_provider(success.provider, started.elapsed()),
                )
            }
            Err(exhausted) => {
                let reason = exhausted.to_string();
                logger.log_degraded(&reason);
                self.degradation.synthesize(request, reason, started)
            }
        }
    }

    /// Provider names registered for a routing key, in fallback order.
    pub fn chain_providers(&self, kind: PayloadKind, tier: CapabilityTier) -> Option<Vec<&str>> {
        self.chains
            .get(&ChainKey { kind, tier })
            .map(|c| c.provider_names())
    }
}

/// Builder assembling an orchestrator from explicit chain registrations.
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    chains: HashMap<ChainKey, Vec<Arc<dyn ProviderAdapter>>>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: OrchestratorConfig::default(),
            chains: HashMap::new(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the full chain for a routing key, replacing any previous one.
    pub fn chain(
        mut self,
        kind: PayloadKind,
        tier: CapabilityTier,
        providers: Vec<Arc<dyn ProviderAdapter>>,
    ) -> Self {
        self.chains.insert(ChainKey { kind, tier }, providers);
        self
    }

    /// Append one provider to a routing key's chain.
    pub fn provider(
        mut self,
        kind: PayloadKind,
        tier: CapabilityTier,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Self {
        self.chains
            .entry(ChainKey { kind, tier })
            .or_default()
            .push(adapter);
        self
    }

    pub fn build(self) -> CoreResult<Orchestrator> {
        if self.chains.is_empty() {
            return Err(CoreError::NoChains);
        }
        for (key, providers) in &self.chains {
            if providers.is_empty() {
                return Err(CoreError::EmptyChain {
                    kind: key.kind,
                    tier: key.tier,
                });
            }
        }

        let degradation = DegradationPolicy::new(self.config.placeholder_edge);
        let chains = self
            .chains
            .into_iter()
            .map(|(key, providers)| (key, FallbackChain::new(providers)))
            .collect();

        Ok(Orchestrator {
            chains,
            pacer: ProviderPacer::new(),
            degradation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_chains() {
        let err = Orchestrator::builder().build().unwrap_err();
        assert!(matches!(err, CoreError::NoChains));
    }

    #[test]
    fn test_build_rejects_empty_chain() {
        let err = Orchestrator::builder()
            .chain(PayloadKind::Text, CapabilityTier::Fast, vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptyChain { .. }));
    }
}
