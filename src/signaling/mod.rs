//! Real-time signaling plane: wire envelopes, message routing, the
//! `WebSocket` endpoint, and the idle-room reaper.

pub mod envelope;
pub mod reaper;
pub mod router;
pub mod socket;
