//! PairCast signaling API - presence and message relay for peer-to-peer
//! screen sharing.
//!
//! This crate brokers the WebRTC handshake between one host and many viewers
//! per room. It never carries media:
//! - Room membership with a single-host guarantee
//! - Offer/answer/ICE relay and watch-party presence messages
//! - Idle-room reclamation and a read-only HTTP surface

pub mod config;
pub mod error;
pub mod rooms;
pub mod routes;
pub mod signaling;
pub mod state;
pub mod utils;
