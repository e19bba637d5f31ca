//! Wire format of plot-server sessions: JSON text frames exchanged over the
//! `/{plot}/ws` WebSocket.

pub mod document;
pub mod frames;
pub mod methods;
