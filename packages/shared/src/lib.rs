//! Shared utilities for the PeerSend workspace.

pub mod logger;
pub mod time;
