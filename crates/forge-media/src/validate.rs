//! Output artifact validation.
//!
//! An external process exiting zero is not proof it produced anything: the
//! output must exist and exceed a minimum plausible size before the job
//! may report success.

use std::path::Path;

use crate::error::{MediaError, MediaResult};

/// Validate that `path` exists and holds at least `min_bytes`.
///
/// Returns the actual size on success.
pub async fn validate_artifact(path: &Path, min_bytes: u64) -> MediaResult<u64> {
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(MediaError::OutputMissing(path.to_path_buf()));
        }
        Err(e) => return Err(MediaError::Io(e)),
    };

    let size = meta.len();
    if size < min_bytes {
        return Err(MediaError::OutputTooSmall {
            path: path.to_path_buf(),
            size,
            min: min_bytes,
        });
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let err = validate_artifact(&dir.path().join("out.mp4"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::OutputMissing(_)));
    }

    #[tokio::test]
    async fn test_undersized_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.mp4");
        tokio::fs::write(&path, vec![0u8; 100]).await.unwrap();

        let err = validate_artifact(&path, 1024).await.unwrap_err();
        match err {
            MediaError::OutputTooSmall { size, min, .. } => {
                assert_eq!(size, 100);
                assert_eq!(min, 1024);
            }
            other => panic!("expected OutputTooSmall, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_valid_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.mp4");
        tokio::fs::write(&path, vec![0u8; 4096]).await.unwrap();

        assert_eq!(validate_artifact(&path, 1024).await.unwrap(), 4096);
    }
}
