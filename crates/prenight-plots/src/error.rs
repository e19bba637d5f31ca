use prenight_provider::ProviderError;
use thiserror::Error;

/// Why a builder could not produce its figure. The message becomes the
/// `Failed` reason shown to plot sessions.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// No blob or greedy survey carries a `Footprint*` basis function.
    #[error("no footprint basis function found in blob or greedy surveys")]
    FootprintNotFound,

    /// Several footprint basis functions disagree.
    #[error("footprint basis functions differ: {}", candidates.join(", "))]
    AmbiguousFootprint { candidates: Vec<String> },

    /// The snapshot produced nothing to draw.
    #[error("nothing to plot: {0}")]
    Empty(String),

    #[error("invalid colour {0:?}, expected #rrggbb")]
    InvalidColour(String),

    #[error("render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, PlotError>;

/// Map a plotters drawing error into [`PlotError::Render`].
pub(crate) fn render_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}
