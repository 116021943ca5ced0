//! Orchestrator configuration.

use std::path::PathBuf;
use std::time::Duration;

use forge_models::encoding::PLACEHOLDER_EDGE;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Default minimum spacing between calls to one provider
    pub default_min_interval: Duration,
    /// Default per-call deadline when a provider declares none
    pub default_deadline: Duration,
    /// Grace period before a killed subprocess is force-reaped
    pub subprocess_kill_grace: Duration,
    /// Root for per-job temporary workdirs
    pub work_dir: PathBuf,
    /// Directory finished video artifacts are moved into
    pub output_dir: PathBuf,
    /// Longest edge of synthesized placeholder images
    pub placeholder_edge: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_min_interval: Duration::from_secs(1),
            default_deadline: Duration::from_secs(30),
            subprocess_kill_grace: Duration::from_secs(2),
            work_dir: PathBuf::from("/tmp/forge"),
            output_dir: PathBuf::from("/tmp/forge/out"),
            placeholder_edge: PLACEHOLDER_EDGE,
        }
    }
}

impl OrchestratorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            default_min_interval: Duration::from_millis(
                std::env::var("FORGE_MIN_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            default_deadline: Duration::from_secs(
                std::env::var("FORGE_DEFAULT_DEADLINE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            subprocess_kill_grace: Duration::from_secs(
                std::env::var("FORGE_KILL_GRACE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            ),
            work_dir: std::env::var("FORGE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/forge")),
            output_dir: std::env::var("FORGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/forge/out")),
            placeholder_edge: std::env::var("FORGE_PLACEHOLDER_EDGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(PLACEHOLDER_EDGE),
        }
    }
}
