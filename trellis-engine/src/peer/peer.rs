use crate::connection::{
    ConnectionHandle, DataChannelConfig, DataChannelHandle, DataChannelState, OfferOptions,
    SignalingState,
};
use crate::dispatch::EventDispatcher;
use crate::error::EngineError;
use crate::session::{SEND_EVENT, SessionEvent};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use trellis_core::{
    IceCandidate, ParticipantId, RoomId, SdpType, SessionDescription, SignalingEvent,
};
use uuid::Uuid;

/// Everything a peer needs from its owning session: local identity, the
/// outbound and notification dispatchers, negotiation options. Cheap to
/// clone; shared by every peer of one session.
#[derive(Clone)]
pub struct PeerContext {
    pub room: RoomId,
    pub local_participant: ParticipantId,
    pub outbound: Arc<EventDispatcher<SignalingEvent>>,
    pub events: Arc<EventDispatcher<SessionEvent>>,
    pub offer_options: OfferOptions,
    pub channel_config: DataChannelConfig,
}

/// One remote participant: its connection handle, its optional data
/// channel, and the per-peer negotiation state machine.
///
/// The negotiation state lives in the connection handle's signaling state
/// (`Stable | HaveLocalOffer | HaveRemoteOffer`); the peer only keeps the
/// eagerly-set `negotiating` flag that suppresses duplicate
/// negotiation-needed signals before the first description commits.
pub struct Peer {
    id: ParticipantId,
    ctx: PeerContext,
    connection: Arc<dyn ConnectionHandle>,
    channel: Mutex<Option<Arc<dyn DataChannelHandle>>>,
    negotiating: AtomicBool,
}

impl Peer {
    pub fn new(id: ParticipantId, ctx: PeerContext, connection: Arc<dyn ConnectionHandle>) -> Self {
        Self {
            id,
            ctx,
            connection,
            channel: Mutex::new(None),
            negotiating: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn is_negotiating(&self) -> bool {
        self.negotiating.load(Ordering::SeqCst)
            || self.connection.signaling_state() != SignalingState::Stable
    }

    /// React to the connection's "negotiation needed" signal. Ignored while
    /// a negotiation is already in flight; the flag is re-derived from the
    /// signaling state once descriptions start moving.
    pub async fn negotiation_needed(&self) -> Result<(), EngineError> {
        if self.is_negotiating() {
            debug!(peer = %self.id, "negotiation needed while already negotiating, ignored");
            return Ok(());
        }
        self.initiate_offer().await
    }

    /// Start a negotiation round from our side: create the data channel if
    /// none exists yet, produce a local offer, commit it, and emit an OFFER
    /// signaling event.
    pub async fn initiate_offer(&self) -> Result<(), EngineError> {
        self.negotiating.store(true, Ordering::SeqCst);
        let result = self.offer_inner().await;
        self.sync_negotiating();
        result
    }

    async fn offer_inner(&self) -> Result<(), EngineError> {
        self.ensure_data_channel().await?;

        let offer = self.connection.create_offer(&self.ctx.offer_options).await?;

        // A remote offer may have landed while ours was being produced;
        // committing the stale one now would clobber that negotiation.
        if self.connection.signaling_state() != SignalingState::Stable {
            debug!(peer = %self.id, "abandoning local offer, remote negotiation in progress");
            return Ok(());
        }

        self.connection.set_local_description(offer.clone()).await?;
        debug!(peer = %self.id, "local offer committed");

        self.ctx.outbound.dispatch(
            SEND_EVENT,
            &SignalingEvent::offer(
                self.ctx.local_participant.clone(),
                self.id.clone(),
                self.ctx.room.clone(),
                offer,
            ),
        );
        Ok(())
    }

    /// Apply a remote description, answering if it is an offer. Called for
    /// both OFFER and ANSWER payloads.
    pub async fn renegotiate(&self, remote: SessionDescription) -> Result<(), EngineError> {
        let result = self.renegotiate_inner(remote).await;
        self.sync_negotiating();
        result
    }

    async fn renegotiate_inner(&self, remote: SessionDescription) -> Result<(), EngineError> {
        let answering = remote.sdp_type == SdpType::Offer;

        if answering && self.connection.signaling_state() != SignalingState::Stable {
            // Glare: both sides offered at once. This side yields
            // unconditionally and discards its pending local offer.
            info!(peer = %self.id, "incoming offer during negotiation, rolling back local offer");
            self.connection
                .set_local_description(SessionDescription::rollback())
                .await?;
        }

        self.connection.set_remote_description(remote).await?;

        if answering {
            let answer = self
                .connection
                .create_answer(&self.ctx.offer_options)
                .await?;
            self.connection
                .set_local_description(answer.clone())
                .await?;
            debug!(peer = %self.id, "local answer committed");

            self.ctx.outbound.dispatch(
                SEND_EVENT,
                &SignalingEvent::answer(
                    self.ctx.local_participant.clone(),
                    self.id.clone(),
                    self.ctx.room.clone(),
                    answer,
                ),
            );
        }
        Ok(())
    }

    /// Feed a candidate received from the remote side into the connection.
    pub async fn handle_remote_candidate(&self, candidate: IceCandidate) -> Result<(), EngineError> {
        self.connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    /// Forward a locally gathered candidate to the remote side. The `None`
    /// sentinel means gathering finished; no end-of-candidates signal
    /// exists in this protocol.
    pub fn handle_local_candidate(&self, candidate: Option<IceCandidate>) {
        let Some(candidate) = candidate else {
            debug!(peer = %self.id, "candidate gathering complete");
            return;
        };

        self.ctx.outbound.dispatch(
            SEND_EVENT,
            &SignalingEvent::candidate(
                self.ctx.local_participant.clone(),
                self.id.clone(),
                self.ctx.room.clone(),
                candidate,
            ),
        );
    }

    /// Install a channel the remote side opened on this connection.
    pub async fn adopt_data_channel(&self, channel: Arc<dyn DataChannelHandle>) {
        debug!(peer = %self.id, label = channel.label(), "adopting remote data channel");
        *self.channel.lock().await = Some(channel);
    }

    /// Keep the negotiation flag in step with the connection's own
    /// signaling state transitions.
    pub fn handle_signaling_state(&self, state: SignalingState) {
        self.negotiating
            .store(state != SignalingState::Stable, Ordering::SeqCst);
    }

    /// Deliver `payload` over the data channel. Silently a no-op unless the
    /// channel exists and is open.
    pub async fn send(&self, payload: Bytes) {
        let channel = self.channel.lock().await.clone();
        let Some(channel) = channel else {
            return;
        };
        if channel.ready_state() != DataChannelState::Open {
            return;
        }
        if let Err(e) = channel.send(payload).await {
            warn!(peer = %self.id, "data channel send failed: {e}");
        }
    }

    /// Close the channel and the connection and notify listeners. Safe to
    /// call repeatedly; every call fires a `"disconnected"` notification.
    pub async fn close(&self) {
        if let Some(channel) = self.channel.lock().await.take() {
            if let Err(e) = channel.close().await {
                debug!(peer = %self.id, "data channel close failed: {e}");
            }
        }
        if let Err(e) = self.connection.close().await {
            debug!(peer = %self.id, "connection close failed: {e}");
        }

        let event = SessionEvent::Disconnected(self.id.clone());
        self.ctx.events.dispatch(event.name(), &event);
    }

    async fn ensure_data_channel(&self) -> Result<(), EngineError> {
        let mut slot = self.channel.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        // The label is never interpreted, it only has to be unique.
        let label = Uuid::new_v4().simple().to_string();
        let channel = self
            .connection
            .create_data_channel(&label, &self.ctx.channel_config)?;
        debug!(peer = %self.id, label = %label, "created data channel");
        *slot = Some(channel);
        Ok(())
    }

    fn sync_negotiating(&self) {
        self.negotiating.store(
            self.connection.signaling_state() != SignalingState::Stable,
            Ordering::SeqCst,
        );
    }
}
