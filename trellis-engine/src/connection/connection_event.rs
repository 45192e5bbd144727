use crate::connection::connection_handle::{
    ConnectionState, DataChannelHandle, IceConnectionState, SignalingState,
};
use bytes::Bytes;
use std::sync::Arc;
use trellis_core::{IceCandidate, MediaTrack, ParticipantId};

/// Everything a connection handle reports back to the engine.
pub enum ConnectionEvent {
    /// A locally gathered ICE candidate; `None` is the end-of-gathering
    /// sentinel.
    LocalCandidate(Option<IceCandidate>),
    /// The remote side opened a data channel on this connection.
    DataChannel(Arc<dyn DataChannelHandle>),
    /// Inbound payload from the connection's data channel.
    Message(Bytes),
    /// A remote media track arrived.
    Track(MediaTrack),
    ConnectionStateChanged(ConnectionState),
    IceConnectionStateChanged(IceConnectionState),
    SignalingStateChanged(SignalingState),
    /// Local changes (tracks added/removed) require a fresh offer.
    NegotiationNeeded,
}

/// A connection event tagged with the peer it belongs to, as delivered to
/// the owning session's event loop.
pub struct PeerEvent {
    pub participant: ParticipantId,
    pub event: ConnectionEvent,
}
