use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declined submission. The caller should re-fetch eligibility and continue.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    #[error("annotator already labeled this comment")]
    AlreadyAnnotated,

    #[error("comment already reached its annotation quota")]
    QuotaExceeded,

    #[error("comment id does not reference a loaded comment")]
    UnknownComment,

    #[error("intensity must be given for abusive labels and only for them")]
    IntensityMismatch,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::AlreadyAnnotated => "ALREADY_ANNOTATED",
            Rejection::QuotaExceeded => "QUOTA_EXCEEDED",
            Rejection::UnknownComment => "UNKNOWN_COMMENT",
            Rejection::IntensityMismatch => "INTENSITY_MISMATCH",
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("schema error: {0}")]
    SchemaError(String),

    #[error("submission rejected: {0}")]
    Rejected(Rejection),

    #[error("forbidden: export requires the privileged identity")]
    Forbidden,

    #[error("no annotator identity supplied")]
    NoIdentity,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl CoreError {
    /// True for user-facing declines that leave the process healthy.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::Rejected(_) | CoreError::Forbidden | CoreError::NoIdentity
        )
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            CoreError::Rejected(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<Rejection> for CoreError {
    fn from(r: Rejection) -> Self {
        CoreError::Rejected(r)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
