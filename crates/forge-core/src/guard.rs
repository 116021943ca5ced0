//! Hard deadlines around provider calls.
//!
//! Request-based calls are bounded on the whole round trip; on expiry the
//! in-flight future is dropped (aborting the underlying request) and a
//! timeout error is returned. Retrying is never this layer's job.
//! Process-based calls get their split startup/completion semantics from
//! `forge_media::process`, which additionally kills and reaps the child.

use std::future::Future;
use std::time::Duration;

use forge_models::{GenerationRequest, ProviderDescriptor};
use forge_providers::{ProviderError, ProviderResult};

/// Bound a provider call by a hard deadline.
pub async fn call_with_deadline<T, F>(deadline: Duration, fut: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::timeout(format!(
            "call exceeded its {:.1}s deadline",
            deadline.as_secs_f64()
        ))),
    }
}

/// Deadline for one provider call: a request override wins over the
/// provider's declared budget.
pub fn effective_deadline(descriptor: &ProviderDescriptor, request: &GenerationRequest) -> Duration {
    request.deadline_override.unwrap_or(descriptor.timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_models::{Artifact, CapabilityTier};

    #[tokio::test]
    async fn test_fast_call_passes_through() {
        let result = call_with_deadline(Duration::from_secs(1), async {
            Ok(Artifact::text("fast"))
        })
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_slow_call_becomes_timeout() {
        let err = call_with_deadline(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Artifact::text("late"))
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_provider_error_passes_unchanged() {
        let err: ProviderResult<Artifact> = call_with_deadline(Duration::from_secs(1), async {
            Err(ProviderError::bad_response(Some(503), "unavailable"))
        })
        .await;
        assert_eq!(err.unwrap_err().status(), Some(503));
    }

    #[test]
    fn test_effective_deadline_override() {
        let descriptor = ProviderDescriptor::new("groq", CapabilityTier::Fast)
            .with_timeout(Duration::from_secs(30));

        let plain = GenerationRequest::text("hi");
        assert_eq!(effective_deadline(&descriptor, &plain), Duration::from_secs(30));

        let tight = GenerationRequest::text("hi").with_deadline(Duration::from_millis(200));
        assert_eq!(
            effective_deadline(&descriptor, &tight),
            Duration::from_millis(200)
        );
    }
}
