use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("invalid grade '{0}', expected one of A*, A, B, C, D, E, U")]
    InvalidGrade(String),

    #[error("invalid academic year '{0}', expected YYYY/YYYY+1")]
    InvalidAcademicYear(String),

    #[error("invalid Alps grade {0}, expected 1-9")]
    InvalidAlpsGrade(u8),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by the text-completion collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CommunicationError {
    pub message: String,
}

impl CommunicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("a request is already in flight for the {0} surface")]
    Busy(String),

    #[error("message is empty")]
    EmptyMessage,

    #[error("error communicating with AI: {0}")]
    Communication(#[from] CommunicationError),
}
