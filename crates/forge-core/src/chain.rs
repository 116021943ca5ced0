//! Ordered provider fallback.
//!
//! Providers are tried strictly in declared order; the first success wins
//! and later providers are never dispatched. Declaration order is
//! authoritative and deterministic, so fallback behavior is reproducible
//! in tests and debuggable in production. A provider that fails is not
//! retried within the same run.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use forge_models::{Artifact, GenerationRequest};
use forge_providers::{ProviderAdapter, ProviderErrorKind};

use crate::guard::{call_with_deadline, effective_deadline};
use crate::pacing::ProviderPacer;

/// One failed attempt in a chain run.
#[derive(Debug)]
pub struct AttemptFailure {
    pub provider: String,
    pub kind: ProviderErrorKind,
    pub error: String,
    pub elapsed: Duration,
}

/// Every provider in the chain failed.
#[derive(Debug)]
pub struct ChainExhausted {
    pub attempts: Vec<AttemptFailure>,
}

impl fmt::Display for ChainExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "all {} providers exhausted: ", self.attempts.len())?;
        for (i, attempt) in self.attempts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} ({})", attempt.provider, attempt.kind.as_str())?;
        }
        Ok(())
    }
}

/// The chain produced an artifact.
#[derive(Debug)]
pub struct ChainSuccess {
    pub artifact: Artifact,
    pub provider: String,
    /// Time spent inside the winning provider call
    pub elapsed: Duration,
}

/// An ordered list of providers for one capability tier.
pub struct FallbackChain {
    providers: Vec<Arc<dyn ProviderAdapter>>,
}

impl FallbackChain {
    pub fn new(providers: Vec<Arc<dyn ProviderAdapter>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in fallback order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers
            .iter()
            .map(|p| p.descriptor().name.as_str())
            .collect()
    }

    /// Try each provider in order until one succeeds.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        pacer: &ProviderPacer,
    ) -> Result<ChainSuccess, ChainExhausted> {
        let mut attempts = Vec::new();

        for provider in &self.providers {
            let descriptor = provider.descriptor();
            pacer
                .await_turn(&descriptor.name, descriptor.min_interval)
                .await;

            let deadline = effective_deadline(descriptor, request);
            let started = Instant::now();
            let result = call_with_deadline(deadline, provider.invoke(request)).await;
            let elapsed = started.elapsed();

            match result {
                Ok(artifact) => {
                    metrics::counter!(
                        "forge_provider_attempts_total",
                        "provider" => descriptor.name.clone(),
                        "outcome" => "success"
                    )
                    .increment(1);
                    info!(
                        request_id = %request.id,
                        provider = %descriptor.name,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Provider satisfied request"
                    );
                    return Ok(ChainSuccess {
                        artifact,
                        provider: descriptor.name.clone(),
                        elapsed,
                    });
                }
                Err(e) => {
                    metrics::counter!(
                        "forge_provider_attempts_total",
                        "provider" => descriptor.name.clone(),
                        "outcome" => e.kind().as_str()
                    )
                    .increment(1);
                    warn!(
                        request_id = %request.id,
                        provider = %descriptor.name,
                        kind = e.kind().as_str(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Provider failed, advancing in chain: {}", e
                    );
                    attempts.push(AttemptFailure {
                        provider: descriptor.name.clone(),
                        kind: e.kind(),
                        error: e.to_string(),
                        elapsed,
                    });
                }
            }
        }

        Err(ChainExhausted { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forge_models::{CapabilityTier, ProviderDescriptor};
    use forge_providers::{ProviderError, ProviderResult};
    use std::sync::atomic::{AtomicU32, Ordering};

    enum Behavior {
        Succeed(&'static str),
        FailStatus(u16),
        Hang(Duration),
    }

    struct FakeAdapter {
        descriptor: ProviderDescriptor,
        behavior: Behavior,
        calls: AtomicU32,
    }

    impl FakeAdapter {
        fn new(name: &str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                descriptor: ProviderDescriptor::new(name, CapabilityTier::Fast)
                    .with_timeout(Duration::from_millis(200))
                    .with_min_interval(Duration::ZERO),
                behavior,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderAdapter for FakeAdapter {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, _request: &GenerationRequest) -> ProviderResult<Artifact> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Succeed(content) => Ok(Artifact::text(*content)),
                Behavior::FailStatus(status) => {
                    Err(ProviderError::bad_response(Some(*status), "upstream error"))
                }
                Behavior::Hang(duration) => {
                    tokio::time::sleep(*duration).await;
                    Ok(Artifact::text("too late"))
                }
            }
        }
    }

    #[tokio::test]
    async fn test_first_failure_falls_through_to_second() {
        let a = FakeAdapter::new("provider-a", Behavior::FailStatus(500));
        let b = FakeAdapter::new("provider-b", Behavior::Succeed("from b"));
        let c = FakeAdapter::new("provider-c", Behavior::Succeed("from c"));
        let chain = FallbackChain::new(vec![a.clone(), b.clone(), c.clone()]);

        let success = chain
            .run(&GenerationRequest::text("hi"), &ProviderPacer::new())
            .await
            .unwrap();

        assert_eq!(success.provider, "provider-b");
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        // First match wins; later providers are never dispatched.
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn test_declaration_order_is_authoritative() {
        let a = FakeAdapter::new("provider-a", Behavior::Succeed("from a"));
        let b = FakeAdapter::new("provider-b", Behavior::Succeed("from b"));
        let chain = FallbackChain::new(vec![a, b]);

        for _ in 0..3 {
            let success = chain
                .run(&GenerationRequest::text("hi"), &ProviderPacer::new())
                .await
                .unwrap();
            assert_eq!(success.provider, "provider-a");
        }
    }

    #[tokio::test]
    async fn test_hanging_provider_times_out_and_chain_advances() {
        let slow = FakeAdapter::new("slow", Behavior::Hang(Duration::from_secs(10)));
        let fast = FakeAdapter::new("fast", Behavior::Succeed("ok"));
        let chain = FallbackChain::new(vec![slow, fast]);

        let started = Instant::now();
        let success = chain
            .run(&GenerationRequest::text("hi"), &ProviderPacer::new())
            .await
            .unwrap();

        assert_eq!(success.provider, "fast");
        // Bounded by the slow provider's 200ms deadline, not its 10s sleep.
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_exhaustion_records_every_attempt_in_order() {
        let a = FakeAdapter::new("provider-a", Behavior::FailStatus(500));
        let b = FakeAdapter::new("provider-b", Behavior::Hang(Duration::from_secs(10)));
        let chain = FallbackChain::new(vec![a, b]);

        let exhausted = chain
            .run(&GenerationRequest::text("hi"), &ProviderPacer::new())
            .await
            .unwrap_err();

        assert_eq!(exhausted.attempts.len(), 2);
        assert_eq!(exhausted.attempts[0].provider, "provider-a");
        assert_eq!(exhausted.attempts[0].kind, ProviderErrorKind::BadResponse);
        assert_eq!(exhausted.attempts[1].provider, "provider-b");
        assert_eq!(exhausted.attempts[1].kind, ProviderErrorKind::Timeout);

        let rendered = exhausted.to_string();
        assert!(rendered.contains("provider-a (bad_response)"));
        assert!(rendered.contains("provider-b (timeout)"));
    }
}
