use thiserror::Error;

/// Per-frame failures. None of these abort a run; the session counts them
/// and moves on to the next frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: String },

    #[error("tagged parameter {tag} not found")]
    TagNotFound { tag: u8 },

    #[error("entity registry full ({capacity} entities)")]
    CapacityExceeded { capacity: usize },
}

impl AnalysisError {
    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        AnalysisError::MalformedFrame {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
