//! Live plot-server documents and the figures attached to them.
//!
//! A figure is shown by at most one document at a time. Attaching it to a
//! new document first removes it from the previous holder, which is told
//! through its [`DocumentEvent`] channel.

pub mod error;
pub mod manager;
pub mod types;

pub use error::SessionError;
pub use manager::DocumentManager;
pub use types::{DocumentEvent, DocumentInfo, Root};
