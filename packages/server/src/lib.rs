//! PeerSend signaling broker library.
//!
//! Pairs a file sender with one or more receivers through a 6-digit session code and
//! relays the WebRTC offer / answer / ICE candidate messages between them.
//! File bytes never pass through the broker.

pub mod app;
pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
