use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use prenight_core::types::DocumentId;
use prenight_core::PlotName;
use prenight_plots::{Figure, FigureId};

use crate::error::{Result, SessionError};
use crate::types::{DocumentEvent, DocumentInfo, Root};

struct Document {
    plot: PlotName,
    opened_at: DateTime<Utc>,
    roots: Vec<Root>,
    notify: Option<mpsc::Sender<DocumentEvent>>,
}

impl Document {
    fn remove_figure(&mut self, figure_id: FigureId) -> bool {
        let before = self.roots.len();
        self.roots.retain(|root| root.figure_id() != Some(figure_id));
        self.roots.len() != before
    }
}

/// Registry of open plot-server documents.
///
/// Lock order is always `attachments` first, then a `documents` shard, so
/// attach and close cannot deadlock against each other.
#[derive(Default)]
pub struct DocumentManager {
    documents: DashMap<DocumentId, Document>,
    /// Figure → the single document currently showing it.
    attachments: Mutex<HashMap<FigureId, DocumentId>>,
}

impl DocumentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty document for `plot`. Events about roots taken away by
    /// other documents are sent on `notify`.
    #[instrument(skip(self, notify), fields(plot = %plot))]
    pub fn open(&self, plot: PlotName, notify: Option<mpsc::Sender<DocumentEvent>>) -> DocumentId {
        let id = DocumentId::new();
        self.documents.insert(
            id.clone(),
            Document {
                plot,
                opened_at: Utc::now(),
                roots: Vec::new(),
                notify,
            },
        );
        debug!(document = %id, "document opened");
        id
    }

    #[instrument(skip(self, text), fields(document = %id))]
    pub fn add_placeholder(&self, id: &DocumentId, text: impl Into<String>) -> Result<()> {
        let mut doc = self.documents.get_mut(id).ok_or_else(|| not_found(id))?;
        doc.roots.push(Root::Placeholder(text.into()));
        Ok(())
    }

    /// Attach `figure` to document `id`, detaching it from whichever document
    /// held it before. Returns that previous holder.
    ///
    /// A previous holder that has already gone away is ignored.
    #[instrument(skip(self, figure), fields(document = %id, figure = %figure.id()))]
    pub fn attach(&self, id: &DocumentId, figure: Arc<Figure>) -> Result<Option<DocumentId>> {
        let figure_id = figure.id();
        let mut attachments = self.lock_attachments();

        if !self.documents.contains_key(id) {
            return Err(not_found(id));
        }

        let previous = match attachments.get(&figure_id) {
            Some(holder) if holder != id => {
                let holder = holder.clone();
                self.detach_from(&holder, figure_id, id);
                Some(holder)
            }
            _ => None,
        };

        let mut doc = self.documents.get_mut(id).ok_or_else(|| not_found(id))?;
        if !doc.roots.iter().any(|r| r.figure_id() == Some(figure_id)) {
            doc.roots.push(Root::Figure(figure));
        }
        drop(doc);
        attachments.insert(figure_id, id.clone());

        debug!(previous = ?previous.as_ref().map(DocumentId::as_str), "figure attached");
        Ok(previous)
    }

    fn detach_from(&self, holder: &DocumentId, figure_id: FigureId, taker: &DocumentId) {
        let Some(mut doc) = self.documents.get_mut(holder) else {
            debug!(holder = %holder, "previous document already closed");
            return;
        };
        if !doc.remove_figure(figure_id) {
            debug!(holder = %holder, "figure already detached");
            return;
        }
        if let Some(notify) = &doc.notify {
            let event = DocumentEvent::RootRemoved {
                figure_id,
                reason: format!("figure moved to document {taker}"),
            };
            if let Err(e) = notify.try_send(event) {
                warn!(holder = %holder, error = %e, "could not notify previous document");
            }
        }
    }

    /// The document currently showing `figure_id`.
    pub fn holder(&self, figure_id: FigureId) -> Option<DocumentId> {
        self.lock_attachments().get(&figure_id).cloned()
    }

    pub fn roots(&self, id: &DocumentId) -> Result<Vec<Root>> {
        self.documents
            .get(id)
            .map(|doc| doc.roots.clone())
            .ok_or_else(|| not_found(id))
    }

    pub fn has_figure_root(&self, id: &DocumentId, figure_id: FigureId) -> bool {
        self.documents
            .get(id)
            .is_some_and(|doc| doc.roots.iter().any(|r| r.figure_id() == Some(figure_id)))
    }

    pub fn info(&self, id: &DocumentId) -> Result<DocumentInfo> {
        let doc = self.documents.get(id).ok_or_else(|| not_found(id))?;
        Ok(DocumentInfo {
            id: id.clone(),
            plot: doc.plot.clone(),
            opened_at: doc.opened_at,
            roots: doc.roots.len(),
        })
    }

    /// Close document `id` and release every figure it holds. Returns the
    /// number of figures released; closing an unknown document is a no-op.
    #[instrument(skip(self), fields(document = %id))]
    pub fn close(&self, id: &DocumentId) -> usize {
        let mut attachments = self.lock_attachments();
        let before = attachments.len();
        attachments.retain(|_, holder| holder != id);
        let released = before - attachments.len();
        if self.documents.remove(id).is_some() {
            debug!(released, "document closed");
        }
        released
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn lock_attachments(&self) -> MutexGuard<'_, HashMap<FigureId, DocumentId>> {
        self.attachments.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(id: &DocumentId) -> SessionError {
    SessionError::NotFound { id: id.to_string() }
}
