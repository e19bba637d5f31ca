use std::sync::Arc;

use chrono::{DateTime, Utc};

use prenight_core::types::DocumentId;
use prenight_core::PlotName;
use prenight_plots::{Figure, FigureId};

/// Top-level content of a document.
#[derive(Debug, Clone)]
pub enum Root {
    Figure(Arc<Figure>),
    /// Text shown while the figure is pending or after it failed.
    Placeholder(String),
}

impl Root {
    pub fn figure_id(&self) -> Option<FigureId> {
        match self {
            Root::Figure(figure) => Some(figure.id()),
            Root::Placeholder(_) => None,
        }
    }
}

/// Pushed to a document's owner when another document changes its roots.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    RootRemoved { figure_id: FigureId, reason: String },
}

/// Summary of an open document.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub id: DocumentId,
    pub plot: PlotName,
    pub opened_at: DateTime<Utc>,
    pub roots: usize,
}
