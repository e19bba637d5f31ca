use thiserror::Error;

/// Errors that can occur during document operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The document was never opened or has already been closed.
    #[error("document not found: {id}")]
    NotFound { id: String },
}

pub type Result<T> = std::result::Result<T, SessionError>;
