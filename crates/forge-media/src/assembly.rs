//! Slideshow assembly pipeline.
//!
//! One job owns one fresh working directory. The lifecycle is
//! `Prepared -> Running -> {Succeeded, TimedOut, Failed}`, and every
//! terminal state is followed by `Cleaned`: the workdir and all
//! intermediate frames are deleted on every exit path, after the final
//! artifact (if any) has been moved out.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tracing::{debug, info, warn};
use uuid::Uuid;

use forge_models::encoding::MIN_VIDEO_BYTES;
use forge_models::SlideshowEncoding;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::fs_utils::move_file;
use crate::normalize::{normalize_frames, RejectedFrame};
use crate::validate::validate_artifact;

/// Lifecycle phase of an assembly job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyPhase {
    Prepared,
    Running,
    Succeeded,
    TimedOut,
    Failed,
    Cleaned,
}

impl AssemblyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyPhase::Prepared => "prepared",
            AssemblyPhase::Running => "running",
            AssemblyPhase::Succeeded => "succeeded",
            AssemblyPhase::TimedOut => "timed_out",
            AssemblyPhase::Failed => "failed",
            AssemblyPhase::Cleaned => "cleaned",
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition(&self, next: AssemblyPhase) -> bool {
        use AssemblyPhase::*;
        matches!(
            (self, next),
            (Prepared, Running)
                | (Prepared, Failed)
                | (Running, Succeeded)
                | (Running, TimedOut)
                | (Running, Failed)
                | (Succeeded, Cleaned)
                | (TimedOut, Cleaned)
                | (Failed, Cleaned)
        )
    }
}

impl fmt::Display for AssemblyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for one slideshow assembly job.
#[derive(Debug, Clone)]
pub struct AssemblyRequest {
    /// Source image files, in display order
    pub frames: Vec<PathBuf>,
    /// Seconds each frame is held on screen
    pub frame_secs: f64,
    /// Directory the finished artifact is moved into
    pub output_dir: PathBuf,
    /// File stem of the finished artifact (`<stem>.mp4`)
    pub file_stem: String,
    /// Encoding settings
    pub encoding: SlideshowEncoding,
    /// Root for the job workdir; system temp when unset
    pub workdir_root: Option<PathBuf>,
    /// Bounded wait for FFmpeg to be spawned
    pub startup_timeout: Duration,
    /// Bounded wait for FFmpeg to exit
    pub completion_timeout: Duration,
    /// Grace period before a killed FFmpeg is force-reaped
    pub kill_grace: Duration,
}

impl AssemblyRequest {
    pub fn new(frames: Vec<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            frames,
            frame_secs: forge_models::encoding::DEFAULT_FRAME_SECS,
            output_dir: output_dir.into(),
            file_stem: format!("slideshow-{}", Uuid::new_v4()),
            encoding: SlideshowEncoding::default(),
            workdir_root: None,
            startup_timeout: Duration::from_secs(10),
            completion_timeout: Duration::from_secs(120),
            kill_grace: Duration::from_secs(2),
        }
    }

    pub fn with_frame_secs(mut self, secs: f64) -> Self {
        self.frame_secs = secs;
        self
    }

    pub fn with_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    pub fn with_deadlines(mut self, startup: Duration, completion: Duration) -> Self {
        self.startup_timeout = startup;
        self.completion_timeout = completion;
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    pub fn with_workdir_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workdir_root = Some(root.into());
        self
    }
}

/// Result of a successful assembly.
#[derive(Debug)]
pub struct AssemblyOutcome {
    /// Final artifact path, outside the (now deleted) workdir
    pub artifact: PathBuf,
    /// Source frames that were rejected during normalization
    pub rejected: Vec<RejectedFrame>,
    /// Number of frames in the finished slideshow
    pub frame_count: usize,
    pub elapsed: Duration,
}

/// Assemble a slideshow video from source images.
///
/// The workdir is deleted on every exit path; on success the artifact has
/// already been moved into `request.output_dir` before cleanup.
pub async fn assemble_slideshow(request: &AssemblyRequest) -> MediaResult<AssemblyOutcome> {
    let start = Instant::now();
    let job_id = Uuid::new_v4();

    let workdir = match &request.workdir_root {
        Some(root) => {
            tokio::fs::create_dir_all(root).await?;
            tempfile::Builder::new().prefix("forge-asm-").tempdir_in(root)?
        }
        None => tempfile::Builder::new().prefix("forge-asm-").tempdir()?,
    };

    debug!(
        job_id = %job_id,
        workdir = %workdir.path().display(),
        sources = request.frames.len(),
        "Assembly job prepared"
    );

    let result = run_phases(request, workdir.path(), job_id).await;

    // Cleanup runs on every path; the artifact was moved out already.
    let cleaned = workdir.close();
    if let Err(e) = cleaned {
        warn!(job_id = %job_id, "Failed to remove assembly workdir: {}", e);
    } else {
        debug!(job_id = %job_id, phase = %AssemblyPhase::Cleaned, "Assembly workdir removed");
    }

    match result {
        Ok((artifact, rejected, frame_count)) => {
            let elapsed = start.elapsed();
            metrics::counter!("forge_assembly_total", "outcome" => "succeeded").increment(1);
            info!(
                job_id = %job_id,
                artifact = %artifact.display(),
                frame_count,
                elapsed_ms = elapsed.as_millis() as u64,
                "Assembly succeeded"
            );
            Ok(AssemblyOutcome {
                artifact,
                rejected,
                frame_count,
                elapsed,
            })
        }
        Err(e) => {
            let outcome = if e.is_timeout() { "timed_out" } else { "failed" };
            metrics::counter!("forge_assembly_total", "outcome" => outcome).increment(1);
            warn!(job_id = %job_id, phase = outcome, "Assembly did not succeed: {}", e);
            Err(e)
        }
    }
}

/// Prepared and Running phases, through artifact relocation.
///
/// Everything here happens inside the workdir, so the caller's
/// unconditional cleanup covers every early return.
async fn run_phases(
    request: &AssemblyRequest,
    workdir: &Path,
    job_id: Uuid,
) -> MediaResult<(PathBuf, Vec<RejectedFrame>, usize)> {
    // Prepared: normalize inputs, reject what cannot be used.
    let normalized = normalize_frames(&request.frames, workdir).await?;

    let manifest = build_concat_manifest(&normalized.frames, request.frame_secs);
    let list_path = workdir.join("frames.txt");
    tokio::fs::write(&list_path, manifest).await?;

    let staged_output = workdir.join("output.mp4");
    let cmd = FfmpegCommand::concat(&list_path, &staged_output).encoding(&request.encoding);

    // Running: deterministic argv, bounded both ways.
    debug!(job_id = %job_id, phase = %AssemblyPhase::Running, "Invoking FFmpeg");
    FfmpegRunner::new()
        .with_deadlines(request.startup_timeout, request.completion_timeout)
        .with_kill_grace(request.kill_grace)
        .run(&cmd)
        .await?;

    // A zero exit is not enough: the artifact must exist and be plausible.
    validate_artifact(&staged_output, MIN_VIDEO_BYTES).await?;

    // Relocate out of the workdir before cleanup deletes it.
    let final_path = request.output_dir.join(format!("{}.mp4", request.file_stem));
    move_file(&staged_output, &final_path).await?;

    Ok((final_path, normalized.rejected, normalized.frames.len()))
}

/// Render the concat demuxer manifest for a frame sequence.
///
/// The last frame is listed twice so its duration entry takes effect.
fn build_concat_manifest(frames: &[PathBuf], frame_secs: f64) -> String {
    let mut manifest = String::from("ffconcat version 1.0\n");
    for frame in frames {
        manifest.push_str(&format!("file '{}'\n", frame.display()));
        manifest.push_str(&format!("duration {:.3}\n", frame_secs));
    }
    if let Some(last) = frames.last() {
        manifest.push_str(&format!("file '{}'\n", last.display()));
    }
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use tempfile::TempDir;

    #[test]
    fn test_concat_manifest_repeats_last_frame() {
        let frames = vec![PathBuf::from("/w/frame_000.jpg"), PathBuf::from("/w/frame_001.jpg")];
        let manifest = build_concat_manifest(&frames, 2.5);

        assert!(manifest.starts_with("ffconcat version 1.0\n"));
        assert_eq!(manifest.matches("frame_001.jpg").count(), 2);
        assert_eq!(manifest.matches("duration 2.500").count(), 2);
    }

    #[test]
    fn test_phase_transitions() {
        use AssemblyPhase::*;
        assert!(Prepared.can_transition(Running));
        assert!(Running.can_transition(TimedOut));
        assert!(TimedOut.can_transition(Cleaned));
        assert!(Failed.can_transition(Cleaned));

        assert!(!Prepared.can_transition(Succeeded));
        assert!(!Cleaned.can_transition(Running));
        assert!(!Succeeded.can_transition(Running));
    }

    #[tokio::test]
    async fn test_unusable_inputs_fail_without_leaking_workdir() {
        let sources = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let workroot = TempDir::new().unwrap();

        let corrupt = sources.path().join("bad.png");
        std::fs::write(&corrupt, vec![0u8; 512]).unwrap();

        let request = AssemblyRequest::new(vec![corrupt], out.path())
            .with_workdir_root(workroot.path());

        let err = assemble_slideshow(&request).await.unwrap_err();
        assert!(matches!(err, MediaError::NoUsableFrames));

        // Every exit path removes the job workdir.
        let leftovers: Vec<_> = std::fs::read_dir(workroot.path()).unwrap().collect();
        assert!(leftovers.is_empty(), "workdir leaked: {leftovers:?}");
        // And nothing was written to the output directory.
        assert!(std::fs::read_dir(out.path()).unwrap().next().is_none());
    }
}
