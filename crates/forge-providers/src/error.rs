//! Provider error taxonomy.
//!
//! Every adapter failure is one of these variants; raw transport errors
//! never cross the adapter boundary, so the chain can treat all providers
//! uniformly and provenance can record *why* a provider failed.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Uniform failure signal from one provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The call exceeded its deadline (transport- or guard-level)
    #[error("timed out: {detail}")]
    Timeout { detail: String },

    /// The backend answered, but not usefully (non-2xx, malformed body,
    /// failed remote job)
    #[error("bad response: {detail}")]
    BadResponse {
        status: Option<u16>,
        detail: String,
    },

    /// The backend could not be reached at all
    #[error("transport failure: {detail}")]
    Transport { detail: String },

    /// The backend claimed success but the artifact fails sanity checks
    /// (empty body, undersized output, unusable inputs)
    #[error("validation failure: {detail}")]
    Validation { detail: String },
}

/// Failure kind, for logs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Timeout,
    BadResponse,
    Transport,
    Validation,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Timeout => "timeout",
            ProviderErrorKind::BadResponse => "bad_response",
            ProviderErrorKind::Transport => "transport",
            ProviderErrorKind::Validation => "validation",
        }
    }
}

impl ProviderError {
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::Timeout {
            detail: detail.into(),
        }
    }

    pub fn bad_response(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::BadResponse {
            status,
            detail: clip_detail(detail.into()),
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport {
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Timeout { .. } => ProviderErrorKind::Timeout,
            ProviderError::BadResponse { .. } => ProviderErrorKind::BadResponse,
            ProviderError::Transport { .. } => ProviderErrorKind::Transport,
            ProviderError::Validation { .. } => ProviderErrorKind::Validation,
        }
    }

    /// HTTP status, where the failure retained one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::BadResponse { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::timeout(e.to_string())
        } else if let Some(status) = e.status() {
            ProviderError::bad_response(Some(status.as_u16()), e.to_string())
        } else {
            ProviderError::transport(e.to_string())
        }
    }
}

/// Cap error details so a huge upstream body never floods logs.
pub(crate) fn clip_detail(mut detail: String) -> String {
    const MAX: usize = 300;
    if detail.len() > MAX {
        let mut cut = MAX;
        while !detail.is_char_boundary(cut) {
            cut -= 1;
        }
        detail.truncate(cut);
        detail.push_str("... (truncated)");
    }
    detail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(ProviderError::timeout("x").kind().as_str(), "timeout");
        assert_eq!(
            ProviderError::bad_response(Some(500), "x").kind().as_str(),
            "bad_response"
        );
        assert_eq!(ProviderError::transport("x").kind().as_str(), "transport");
        assert_eq!(ProviderError::validation("x").kind().as_str(), "validation");
    }

    #[test]
    fn test_status_retained() {
        let err = ProviderError::bad_response(Some(429), "rate limited");
        assert_eq!(err.status(), Some(429));
        assert_eq!(ProviderError::timeout("x").status(), None);
    }

    #[test]
    fn test_clip_detail() {
        let long = "a".repeat(1000);
        let clipped = clip_detail(long);
        assert!(clipped.len() < 350);
        assert!(clipped.ends_with("(truncated)"));

        assert_eq!(clip_detail("short".to_string()), "short");
    }
}
