use crate::model::participant::ParticipantId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalingEventType {
    Connect,
    Disconnect,
    Offer,
    Answer,
    Candidate,
}

impl fmt::Display for SignalingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::Offer => "OFFER",
            Self::Answer => "ANSWER",
            Self::Candidate => "CANDIDATE",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Rollback,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    #[serde(default)]
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }

    /// The pseudo-description that abandons a pending local offer.
    pub fn rollback() -> Self {
        Self {
            sdp_type: SdpType::Rollback,
            sdp: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EventPayload {
    Description(SessionDescription),
    Candidate(IceCandidate),
}

/// The wire message exchanged between participants through the external
/// signaling transport. Every outbound event carries the sending session's
/// local participant id as `caller`; `callee` is absent for room-wide
/// notices (CONNECT/DISCONNECT).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalingEvent {
    #[serde(rename = "type")]
    pub event_type: SignalingEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callee: Option<ParticipantId>,
    pub room: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<EventPayload>,
}

impl SignalingEvent {
    pub fn connect(caller: ParticipantId, room: RoomId) -> Self {
        Self {
            event_type: SignalingEventType::Connect,
            caller: Some(caller),
            callee: None,
            room,
            payload: None,
        }
    }

    pub fn disconnect(caller: ParticipantId, room: RoomId) -> Self {
        Self {
            event_type: SignalingEventType::Disconnect,
            caller: Some(caller),
            callee: None,
            room,
            payload: None,
        }
    }

    pub fn offer(
        caller: ParticipantId,
        callee: ParticipantId,
        room: RoomId,
        description: SessionDescription,
    ) -> Self {
        Self {
            event_type: SignalingEventType::Offer,
            caller: Some(caller),
            callee: Some(callee),
            room,
            payload: Some(EventPayload::Description(description)),
        }
    }

    pub fn answer(
        caller: ParticipantId,
        callee: ParticipantId,
        room: RoomId,
        description: SessionDescription,
    ) -> Self {
        Self {
            event_type: SignalingEventType::Answer,
            caller: Some(caller),
            callee: Some(callee),
            room,
            payload: Some(EventPayload::Description(description)),
        }
    }

    pub fn candidate(
        caller: ParticipantId,
        callee: ParticipantId,
        room: RoomId,
        candidate: IceCandidate,
    ) -> Self {
        Self {
            event_type: SignalingEventType::Candidate,
            caller: Some(caller),
            callee: Some(callee),
            room,
            payload: Some(EventPayload::Candidate(candidate)),
        }
    }

    pub fn description(&self) -> Option<&SessionDescription> {
        match &self.payload {
            Some(EventPayload::Description(desc)) => Some(desc),
            _ => None,
        }
    }

    pub fn ice_candidate(&self) -> Option<&IceCandidate> {
        match &self.payload {
            Some(EventPayload::Candidate(candidate)) => Some(candidate),
            _ => None,
        }
    }
}
