use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrenightError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session protocol error: {0}")]
    Protocol(String),

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Unknown plot: {name}")]
    UnknownPlot { name: String },

    #[error("Origin not allowed: {origin}")]
    OriginRejected { origin: String },

    #[error("Figure not ready: {name}")]
    FigureNotReady { name: String },

    #[error("Figure generation failed: {0}")]
    Generation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrenightError {
    /// Short error code string sent to clients in session RES frames.
    pub fn code(&self) -> &'static str {
        match self {
            PrenightError::Config(_) => "CONFIG_ERROR",
            PrenightError::Protocol(_) => "PROTOCOL_ERROR",
            PrenightError::MethodNotFound { .. } => "METHOD_NOT_FOUND",
            PrenightError::UnknownPlot { .. } => "UNKNOWN_PLOT",
            PrenightError::OriginRejected { .. } => "ORIGIN_REJECTED",
            PrenightError::FigureNotReady { .. } => "FIGURE_NOT_READY",
            PrenightError::Generation(_) => "GENERATION_FAILED",
            PrenightError::Serialization(_) => "SERIALIZATION_ERROR",
            PrenightError::Io(_) => "IO_ERROR",
            PrenightError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            PrenightError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PrenightError>;
