//! Resilient multi-provider generation orchestrator.
//!
//! Composes per-provider pacing, an ordered fallback chain, hard per-call
//! deadlines and a synthetic degradation policy into one call:
//! `generate(request) -> GenerationResult`. The top-level call never
//! fails; every outcome is carried as data with provenance attached.
//!
//! ```no_run
//! use std::sync::Arc;
//! use forge_core::{Orchestrator, OrchestratorConfig};
//! use forge_models::{CapabilityTier, GenerationRequest, PayloadKind};
//! use forge_providers::ChatCompletionsAdapter;
//!
//! # async fn example() {
//! let orchestrator = Orchestrator::builder()
//!     .with_config(OrchestratorConfig::from_env())
//!     .chain(
//!         PayloadKind::Text,
//!         CapabilityTier::Fast,
//!         vec![
//!             Arc::new(ChatCompletionsAdapter::groq("key")),
//!             Arc::new(ChatCompletionsAdapter::mistral("key")),
//!         ],
//!     )
//!     .build()
//!     .unwrap();
//!
//! let result = orchestrator
//!     .generate(&GenerationRequest::text("write a caption"))
//!     .await;
//! println!("{:?}", result.report());
//! # }
//! ```

pub mod chain;
pub mod config;
pub mod degrade;
pub mod error;
pub mod guard;
pub mod logging;
pub mod orchestrator;
pub mod pacing;

pub use chain::{AttemptFailure, ChainExhausted, ChainSuccess, FallbackChain};
pub use config::OrchestratorConfig;
pub use degrade::DegradationPolicy;
pub use error::{CoreError, CoreResult};
pub use guard::{call_with_deadline, effective_deadline};
pub use logging::GenerationLogger;
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use pacing::ProviderPacer;
