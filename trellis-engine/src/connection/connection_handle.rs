use crate::connection::connection_config::{DataChannelConfig, OfferOptions, TransportConfig};
use crate::connection::connection_error::ConnectionError;
use crate::connection::connection_event::PeerEvent;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;
use trellis_core::{IceCandidate, MediaTrack, ParticipantId, SessionDescription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed | Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl IceConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed | Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannelState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// The external capability that performs ICE/DTLS/SCTP setup and media
/// transport for a single peer. The engine drives the offer/answer state
/// machine through it and never owns the actual transport.
///
/// `set_local_description` must accept the rollback pseudo-description
/// (`SessionDescription::rollback()`) to abandon a pending local offer.
#[async_trait]
pub trait ConnectionHandle: Send + Sync {
    async fn create_offer(
        &self,
        options: &OfferOptions,
    ) -> Result<SessionDescription, ConnectionError>;

    async fn create_answer(
        &self,
        options: &OfferOptions,
    ) -> Result<SessionDescription, ConnectionError>;

    async fn set_local_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), ConnectionError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), ConnectionError>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), ConnectionError>;

    fn create_data_channel(
        &self,
        label: &str,
        config: &DataChannelConfig,
    ) -> Result<Arc<dyn DataChannelHandle>, ConnectionError>;

    fn add_track(&self, track: &MediaTrack) -> Result<(), ConnectionError>;

    fn signaling_state(&self) -> SignalingState;

    fn connection_state(&self) -> ConnectionState;

    fn ice_connection_state(&self) -> IceConnectionState;

    fn local_description(&self) -> Option<SessionDescription>;

    async fn close(&self) -> Result<(), ConnectionError>;
}

/// One data channel, locally created or received from the remote side.
/// Inbound payloads are reported through the connection's event sender as
/// `ConnectionEvent::Message`, not through this handle.
#[async_trait]
pub trait DataChannelHandle: Send + Sync {
    async fn send(&self, payload: Bytes) -> Result<(), ConnectionError>;

    fn ready_state(&self) -> DataChannelState;

    fn label(&self) -> &str;

    async fn close(&self) -> Result<(), ConnectionError>;
}

/// Creates one connection handle per peer. `events` is the channel the
/// handle must report its event surface into, tagged with `participant`.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn create_connection(
        &self,
        participant: ParticipantId,
        config: &TransportConfig,
        events: mpsc::Sender<PeerEvent>,
    ) -> Result<Arc<dyn ConnectionHandle>, ConnectionError>;
}
