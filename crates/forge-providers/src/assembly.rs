//! Video assembly adapter.
//!
//! Wraps the `forge-media` slideshow pipeline behind the same interface as
//! the HTTP providers, so the chain, pacing and degradation machinery
//! apply to subprocess work unchanged.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use forge_media::{assemble_slideshow, AssemblyRequest, MediaError};
use forge_models::{Artifact, CapabilityTier, GenerationRequest, ProviderDescriptor, SlideshowEncoding};

use crate::adapter::{video_spec, ProviderAdapter};
use crate::error::{ProviderError, ProviderResult};

/// FFmpeg slideshow assembly as a provider.
pub struct FfmpegAssemblyAdapter {
    descriptor: ProviderDescriptor,
    output_dir: PathBuf,
    workdir_root: Option<PathBuf>,
    encoding: SlideshowEncoding,
    kill_grace: Duration,
}

impl FfmpegAssemblyAdapter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            // A local subprocess needs no inter-call spacing.
            descriptor: ProviderDescriptor::new("ffmpeg", CapabilityTier::Fast)
                .with_timeout(Duration::from_secs(180))
                .with_min_interval(Duration::ZERO),
            output_dir: output_dir.into(),
            workdir_root: None,
            encoding: SlideshowEncoding::default(),
            kill_grace: Duration::from_secs(2),
        }
    }

    pub fn with_encoding(mut self, encoding: SlideshowEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_workdir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workdir_root = Some(root.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.descriptor = self.descriptor.with_timeout(timeout);
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }
}

#[async_trait]
impl ProviderAdapter for FfmpegAssemblyAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, request: &GenerationRequest) -> ProviderResult<Artifact> {
        let spec = video_spec(request)?;
        if spec.frames.is_empty() {
            return Err(ProviderError::validation("no source frames"));
        }

        let deadline = request.deadline_override.unwrap_or(self.descriptor.timeout);
        let (startup, completion) = split_deadline(deadline);

        let mut assembly = AssemblyRequest::new(spec.frames.clone(), &self.output_dir)
            .with_frame_secs(spec.frame_secs)
            .with_deadlines(startup, completion)
            .with_kill_grace(self.kill_grace);
        assembly.encoding = self.encoding.clone();
        if let Some(root) = &self.workdir_root {
            assembly = assembly.with_workdir_root(root);
        }

        let outcome = assemble_slideshow(&assembly).await.map_err(map_media_error)?;
        Ok(Artifact::file(outcome.artifact))
    }
}

/// Split one call deadline into startup and completion budgets.
fn split_deadline(deadline: Duration) -> (Duration, Duration) {
    let startup = (deadline / 10).clamp(Duration::from_secs(1), Duration::from_secs(10));
    let completion = deadline.saturating_sub(startup).max(Duration::from_secs(1));
    (startup, completion)
}

fn map_media_error(e: MediaError) -> ProviderError {
    if e.is_timeout() {
        return ProviderError::timeout(e.to_string());
    }
    match &e {
        MediaError::OutputMissing(_)
        | MediaError::OutputTooSmall { .. }
        | MediaError::NoUsableFrames => ProviderError::validation(e.to_string()),
        MediaError::ProcessFailed { stderr, .. } => {
            let mut detail = e.to_string();
            if let Some(stderr) = stderr.as_deref().filter(|s| !s.is_empty()) {
                detail.push_str(": ");
                detail.push_str(stderr);
            }
            ProviderError::bad_response(None, detail)
        }
        _ => ProviderError::transport(e.to_string()),
    }
}
