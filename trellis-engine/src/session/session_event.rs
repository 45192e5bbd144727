use crate::error::EngineError;
use bytes::Bytes;
use trellis_core::{MediaTrack, ParticipantId};

/// Topic under which outbound signaling events are dispatched; the external
/// transport subscribes here and delivers them over the network.
pub const SEND_EVENT: &str = "send";

pub const PARTICIPANT_EVENT: &str = "participant";
pub const MESSAGE_EVENT: &str = "message";
pub const TRACK_EVENT: &str = "track";
pub const DISCONNECTED_EVENT: &str = "disconnected";
pub const ERROR_EVENT: &str = "error";

/// Application-facing notification, fanned out through the session's
/// notification dispatcher under the topic `name()` returns.
#[derive(Debug)]
pub enum SessionEvent {
    /// A new remote participant was discovered.
    Participant(ParticipantId),
    /// Data channel payload received from a peer.
    Message { from: ParticipantId, payload: Bytes },
    /// A remote media track arrived on a peer connection.
    Track { from: ParticipantId, track: MediaTrack },
    /// A peer was closed, locally or because its connection died.
    Disconnected(ParticipantId),
    /// A negotiation or transport failure; never fatal to the session.
    Error {
        from: Option<ParticipantId>,
        error: EngineError,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Participant(_) => PARTICIPANT_EVENT,
            Self::Message { .. } => MESSAGE_EVENT,
            Self::Track { .. } => TRACK_EVENT,
            Self::Disconnected(_) => DISCONNECTED_EVENT,
            Self::Error { .. } => ERROR_EVENT,
        }
    }
}
