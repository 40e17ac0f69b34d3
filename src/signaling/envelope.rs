//! Wire-format envelopes for the signaling `WebSocket`.
//!
//! Inbound messages decode into a closed tagged enum: an unrecognized `type`
//! is distinguished from a malformed payload so the router can apply a
//! uniform policy to each.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rooms::{MemberSnapshot, Role};

/// A message received from a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEnvelope {
    Offer {
        #[serde(default)]
        target: Option<String>,
        sdp: String,
    },
    Answer {
        #[serde(default)]
        target: Option<String>,
        sdp: String,
    },
    IceCandidate {
        #[serde(default)]
        target: Option<String>,
        candidate: Value,
    },
    ScreenRequest,
    ScreenSharingStarted,
    ScreenSharingStopped,
    Chat {
        message: String,
    },
    Play,
    Pause,
    Seek {
        time: f64,
    },
    VideoChange {
        url: String,
    },
    Ping,
    GetRoomInfo,
}

/// The `type` tags [`ClientEnvelope`] recognizes.
const KNOWN_TYPES: &[&str] = &[
    "offer",
    "answer",
    "ice-candidate",
    "screen-request",
    "screen-sharing-started",
    "screen-sharing-stopped",
    "chat",
    "play",
    "pause",
    "seek",
    "video-change",
    "ping",
    "get-room-info",
];

/// Why an inbound message could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not JSON, no `type` field, or missing required fields for a known
    /// type. Dropped silently.
    Malformed,
    /// Well-formed JSON whose `type` is not one we route.
    UnknownType(String),
}

#[derive(Deserialize)]
struct TypeProbe {
    #[serde(rename = "type")]
    kind: String,
}

impl ClientEnvelope {
    /// Decode one inbound text frame.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnknownType`] when the envelope carries a `type` tag we
    /// do not route; [`DecodeError::Malformed`] for everything else that
    /// fails to decode.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text).map_err(|_| DecodeError::Malformed)?;
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(envelope) => Ok(envelope),
            Err(_) => {
                let probe: TypeProbe =
                    serde_json::from_value(value).map_err(|_| DecodeError::Malformed)?;
                if KNOWN_TYPES.contains(&probe.kind.as_str()) {
                    // Known tag, unusable fields.
                    Err(DecodeError::Malformed)
                } else {
                    Err(DecodeError::UnknownType(probe.kind))
                }
            }
        }
    }
}

/// A message sent to a client. Field names follow the browser client's
/// camelCase convention.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEnvelope {
    #[serde(rename_all = "camelCase")]
    Welcome {
        user_id: String,
        username: String,
        room: String,
        role: Role,
    },
    #[serde(rename_all = "camelCase")]
    HostInfo { host_id: String, host_name: String },
    #[serde(rename_all = "camelCase")]
    HostJoined { host_id: String, host_name: String },
    #[serde(rename_all = "camelCase")]
    ViewersList { viewers: Vec<ViewerIdentity> },
    #[serde(rename_all = "camelCase")]
    ViewerJoined {
        viewer_id: String,
        viewer_name: String,
    },
    #[serde(rename_all = "camelCase")]
    ViewerLeft { viewer_id: String },
    HostLeft,
    #[serde(rename_all = "camelCase")]
    Offer {
        sender: String,
        sender_name: String,
        sdp: String,
    },
    #[serde(rename_all = "camelCase")]
    Answer {
        sender: String,
        sender_name: String,
        sdp: String,
    },
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        sender: String,
        sender_name: String,
        candidate: Value,
    },
    #[serde(rename_all = "camelCase")]
    ScreenRequest {
        viewer_id: String,
        viewer_name: String,
    },
    #[serde(rename_all = "camelCase")]
    ScreenSharingStarted { host_id: String, host_name: String },
    #[serde(rename_all = "camelCase")]
    ScreenSharingStopped { host_id: String, host_name: String },
    #[serde(rename_all = "camelCase")]
    Chat {
        sender: String,
        sender_name: String,
        message: String,
    },
    Play { sender: String },
    Pause { sender: String },
    Seek { sender: String, time: f64 },
    VideoChange { sender: String, url: String },
    Pong,
    #[serde(rename_all = "camelCase")]
    RoomInfo {
        host: Option<MemberSnapshot>,
        viewers: Vec<MemberSnapshot>,
        viewer_count: usize,
    },
    Error { message: String },
}

/// One entry of a `viewers-list` envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerIdentity {
    pub viewer_id: String,
    pub viewer_name: String,
}

impl ServerEnvelope {
    /// Serialize to the wire. These shapes cannot fail to serialize, so a
    /// failure collapses to an empty string rather than a panic path.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
