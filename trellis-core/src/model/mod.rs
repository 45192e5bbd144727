mod participant;
mod room;
mod signaling;
mod track;

pub use participant::ParticipantId;
pub use room::RoomId;
pub use signaling::{
    EventPayload, IceCandidate, IceServerConfig, SdpType, SessionDescription, SignalingEvent,
    SignalingEventType,
};
pub use track::{MediaKind, MediaTrack};
