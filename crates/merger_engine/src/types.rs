use std::fmt;

use merger_core::RemoteStatus;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    /// Message reported by the service, or a description of the local fault.
    /// Empty when the service answered without one.
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The service itself answered with a failure, as opposed to the request
    /// never getting a usable answer.
    pub fn is_definite(&self) -> bool {
        matches!(self.kind, FailureKind::HttpStatus(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    Io,
    TooLarge { max_bytes: u64, actual: Option<u64> },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
        }
    }
}

/// Answer to a status query that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReply {
    /// The service has not written a status yet.
    NotYetAvailable,
    Ready(RemoteStatus),
}

/// Downloadable results of a completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Docx,
    Pdf,
}

impl Artifact {
    pub fn route(self) -> &'static str {
        match self {
            Artifact::Docx => "download/docx",
            Artifact::Pdf => "download/pdf",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Docx => "merged.docx",
            Artifact::Pdf => "merged.pdf",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Docx => write!(f, "DOCX"),
            Artifact::Pdf => write!(f, "PDF"),
        }
    }
}
