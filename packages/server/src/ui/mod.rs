//! Signaling broker HTTP / WebSocket front end.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
