pub mod connection;
pub mod handshake;
pub mod message;
pub mod origin;
pub mod payload;
pub mod send;
