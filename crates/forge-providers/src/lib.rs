//! Provider adapters for the mediaforge orchestrator.
//!
//! Each adapter wraps exactly one external backend (an HTTP API or an
//! external process) behind the uniform [`ProviderAdapter`] interface and
//! translates every transport-level failure into a [`ProviderError`].
//! Adapters never decide fallback policy; that belongs to the chain.

pub mod adapter;
pub mod assembly;
pub mod error;
pub mod image;
pub mod text;

pub use adapter::ProviderAdapter;
pub use assembly::FfmpegAssemblyAdapter;
pub use error::{ProviderError, ProviderErrorKind, ProviderResult};
pub use image::{CraiyonAdapter, ImagineAdapter, PollinationsAdapter, ProdiaAdapter};
pub use text::ChatCompletionsAdapter;
