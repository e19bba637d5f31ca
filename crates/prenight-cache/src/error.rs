use prenight_core::PlotName;
use thiserror::Error;

/// Errors raised by the figure registry and orchestrator. Builder failures
/// are not errors here: they are recorded as `FigureState::Failed`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A builder is already registered under this name.
    #[error("plot already registered: {name}")]
    DuplicatePlot { name: PlotName },

    /// No builder is registered under this name.
    #[error("unknown plot: {name}")]
    UnknownPlot { name: PlotName },

    /// `shutdown` has been called; no new work is accepted.
    #[error("orchestrator is shutting down")]
    ShuttingDown,
}

pub type Result<T> = std::result::Result<T, CacheError>;
