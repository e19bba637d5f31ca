//! Shared configuration, error taxonomy and identifiers for the prenight
//! dashboard workspace.

pub mod config;
pub mod error;
pub mod types;

pub use error::{PrenightError, Result};
pub use types::PlotName;
