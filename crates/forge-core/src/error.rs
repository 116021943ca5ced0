//! Orchestrator construction errors.
//!
//! `generate` itself never returns an error; only building a
//! misconfigured orchestrator does.

use forge_models::{CapabilityTier, PayloadKind};
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("chain for {kind}/{tier} has no providers")]
    EmptyChain {
        kind: PayloadKind,
        tier: CapabilityTier,
    },

    #[error("no chains registered")]
    NoChains,
}
