//! The uniform provider interface.

use async_trait::async_trait;

use forge_models::{
    Artifact, GenerationRequest, ImageSpec, ProviderDescriptor, TextSpec, VideoSpec,
};

use crate::error::{ProviderError, ProviderResult};

/// One external backend capable of attempting a generation request.
///
/// An adapter owns exactly one transport and its wire format. It reports
/// every failure as a [`ProviderError`]; whether and where to fall back
/// is the chain's decision, never the adapter's.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Identity and budgets of this provider.
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Attempt the request against this provider.
    async fn invoke(&self, request: &GenerationRequest) -> ProviderResult<Artifact>;
}

/// Extract the text payload or fail uniformly.
pub(crate) fn text_spec(request: &GenerationRequest) -> ProviderResult<&TextSpec> {
    request
        .payload
        .as_text()
        .ok_or_else(|| ProviderError::validation("expected a text payload"))
}

/// Extract the image payload or fail uniformly.
pub(crate) fn image_spec(request: &GenerationRequest) -> ProviderResult<&ImageSpec> {
    request
        .payload
        .as_image()
        .ok_or_else(|| ProviderError::validation("expected an image payload"))
}

/// Extract the video payload or fail uniformly.
pub(crate) fn video_spec(request: &GenerationRequest) -> ProviderResult<&VideoSpec> {
    request
        .payload
        .as_video()
        .ok_or_else(|| ProviderError::validation("expected a video payload"))
}
