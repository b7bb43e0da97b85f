//! Downstream failure taxonomy.

use std::fmt;

use thiserror::Error;

/// Why the peer could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    Timeout,
    Network,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Timeout => write!(f, "timeout"),
            UnavailableReason::Network => write!(f, "network"),
        }
    }
}

/// Errors that can occur on the single downstream call.
#[derive(Debug, Error)]
pub enum DownstreamError {
    /// Timed out, refused, reset or otherwise unreachable.
    #[error("downstream unavailable ({reason}): {detail}")]
    Unavailable {
        reason: UnavailableReason,
        detail: String,
    },

    /// The peer answered with a non-success status.
    #[error("downstream responded with status {status}")]
    Upstream { status: u16 },
}

impl DownstreamError {
    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: UnavailableReason::Timeout,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: UnavailableReason::Network,
            detail: detail.into(),
        }
    }

    /// Short label used for metrics and span attributes.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Unavailable {
                reason: UnavailableReason::Timeout,
                ..
            } => "timeout",
            Self::Unavailable { .. } => "network_error",
            Self::Upstream { .. } => "upstream_error",
        }
    }
}

impl From<reqwest::Error> for DownstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}
