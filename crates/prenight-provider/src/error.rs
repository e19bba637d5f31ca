use thiserror::Error;

/// Errors raised while reading or interpreting Data Provider inputs.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The snapshot or visit file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid JSON for the expected layout.
    #[error("snapshot decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The snapshot has no night block covering the requested time.
    #[error("no night events cover MJD {mjd}")]
    NoNight { mjd: f64 },

    /// The ephemeris table does not span the requested time.
    #[error("no sun/moon ephemeris at MJD {mjd}")]
    NoEphemeris { mjd: f64 },

    /// Structural problem in the snapshot (unsorted tables, length mismatch).
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A footprint's coordinate and value arrays disagree.
    #[error("invalid footprint: {0}")]
    InvalidFootprint(String),

    /// The configured display timezone is not a known IANA name.
    #[error("unknown timezone: {0}")]
    Timezone(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
