use crate::connection::{
    ConnectionEvent, ConnectionFactory, DataChannelConfig, OfferOptions, PeerEvent,
    TransportConfig,
};
use crate::dispatch::EventDispatcher;
use crate::error::EngineError;
use crate::peer::{Peer, PeerContext};
use crate::session::session_command::SessionCommand;
use crate::session::session_event::{SEND_EVENT, SessionEvent};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use trellis_core::{MediaTrack, ParticipantId, RoomId, SignalingEvent, SignalingEventType};

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub transport: TransportConfig,
    pub channel: DataChannelConfig,
    pub offer_options: OfferOptions,
    /// Tracks attached to every newly created peer connection.
    pub local_tracks: Vec<MediaTrack>,
}

/// One logical room: the local participant identity plus the set of remote
/// peers, with all state mutated from a single event loop.
///
/// Creating a session immediately announces presence with a CONNECT event
/// on the outbound dispatcher, so the `"send"` subscriber must be
/// registered before construction.
pub struct Session {
    id: RoomId,
    local_participant: ParticipantId,
    config: SessionConfig,
    peers: HashMap<ParticipantId, Peer>,
    outbound: Arc<EventDispatcher<SignalingEvent>>,
    events: Arc<EventDispatcher<SessionEvent>>,
    factory: Arc<dyn ConnectionFactory>,
    command_rx: mpsc::Receiver<SessionCommand>,
    conn_tx: mpsc::Sender<PeerEvent>,
    conn_rx: mpsc::Receiver<PeerEvent>,
}

impl Session {
    pub fn new(
        id: RoomId,
        config: SessionConfig,
        factory: Arc<dyn ConnectionFactory>,
        outbound: Arc<EventDispatcher<SignalingEvent>>,
        command_rx: mpsc::Receiver<SessionCommand>,
    ) -> Self {
        let local_participant = ParticipantId::generate();
        let (conn_tx, conn_rx) = mpsc::channel(256);

        info!(room = %id, participant = %local_participant, "joining room");
        outbound.dispatch(
            SEND_EVENT,
            &SignalingEvent::connect(local_participant.clone(), id.clone()),
        );

        Self {
            id,
            local_participant,
            config,
            peers: HashMap::new(),
            outbound,
            events: Arc::new(EventDispatcher::new()),
            factory,
            command_rx,
            conn_tx,
            conn_rx,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn local_participant(&self) -> &ParticipantId {
        &self.local_participant
    }

    /// The notification dispatcher carrying `"participant"`, `"message"`,
    /// `"track"`, `"disconnected"` and `"error"` events.
    pub fn events(&self) -> Arc<EventDispatcher<SessionEvent>> {
        self.events.clone()
    }

    /// Register a notification handler; shorthand for `events().register`.
    pub fn on<F>(&self, event: impl Into<String>, handler: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.events.register(event, handler);
    }

    pub fn participants(&self) -> Vec<ParticipantId> {
        self.peers.keys().cloned().collect()
    }

    pub fn peer(&self, participant: &ParticipantId) -> Option<&Peer> {
        self.peers.get(participant)
    }

    /// Event loop: consumes commands from the embedding application and
    /// events from the peers' connection handles until disconnected.
    pub async fn run(mut self) {
        info!(room = %self.id, "session event loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Signal(event)) => {
                            self.handle_signaling_event(event).await;
                        }
                        Some(SessionCommand::Broadcast(payload)) => {
                            self.broadcast(payload).await;
                        }
                        Some(SessionCommand::Disconnect) | None => {
                            self.disconnect().await;
                            break;
                        }
                    }
                }

                event = self.conn_rx.recv() => {
                    if let Some(event) = event {
                        self.handle_connection_event(event).await;
                    }
                }
            }
        }

        info!(room = %self.id, "session event loop finished");
    }

    /// Route one inbound signaling event. Events for other rooms and events
    /// without a caller are dropped; handler failures surface as `"error"`
    /// notifications, never as panics or return values.
    pub async fn handle_signaling_event(&mut self, event: SignalingEvent) {
        if event.room != self.id {
            debug!(room = %event.room, "ignoring event for another room");
            return;
        }
        let Some(caller) = event.caller.clone() else {
            debug!(kind = %event.event_type, "ignoring event without caller");
            return;
        };

        match event.event_type {
            SignalingEventType::Connect => self.on_connect(caller).await,
            SignalingEventType::Disconnect => self.on_disconnect(caller).await,
            SignalingEventType::Offer => self.on_offer(caller, event).await,
            SignalingEventType::Answer => self.on_answer(caller, event).await,
            SignalingEventType::Candidate => self.on_candidate(caller, event).await,
        }
    }

    /// Forward `payload` to every current peer; peers without an open data
    /// channel silently no-op.
    pub async fn broadcast(&self, payload: Bytes) {
        for peer in self.peers.values() {
            peer.send(payload.clone()).await;
        }
    }

    /// Announce departure, then remove and close every peer.
    pub async fn disconnect(&mut self) {
        info!(room = %self.id, participant = %self.local_participant, "leaving room");
        self.outbound.dispatch(
            SEND_EVENT,
            &SignalingEvent::disconnect(self.local_participant.clone(), self.id.clone()),
        );

        // Snapshot the key set first; closing mutates the map.
        let participants: Vec<ParticipantId> = self.peers.keys().cloned().collect();
        for participant in participants {
            let Some(peer) = self.peers.remove(&participant) else {
                continue;
            };
            peer.close().await;
        }
    }

    async fn on_connect(&mut self, caller: ParticipantId) {
        if self.peers.contains_key(&caller) {
            return;
        }
        // The new arrival waits passively; the remote side drives the first
        // offer once its connection reports negotiation needed.
        self.create_peer(caller).await;
    }

    async fn on_disconnect(&mut self, caller: ParticipantId) {
        let Some(peer) = self.peers.remove(&caller) else {
            return;
        };
        info!(room = %self.id, peer = %caller, "participant left");
        peer.close().await;
    }

    async fn on_offer(&mut self, caller: ParticipantId, event: SignalingEvent) {
        let Some(description) = event.description().cloned() else {
            self.emit_error(
                Some(caller),
                EngineError::MissingPayload(SignalingEventType::Offer),
            );
            return;
        };

        if !self.peers.contains_key(&caller) && !self.create_peer(caller.clone()).await {
            return;
        }
        let Some(peer) = self.peers.get(&caller) else {
            return;
        };

        if let Err(e) = peer.renegotiate(description).await {
            warn!(peer = %caller, "offer handling failed: {e}");
            self.emit_error(Some(caller), e);
        }
    }

    async fn on_answer(&mut self, caller: ParticipantId, event: SignalingEvent) {
        let Some(peer) = self.peers.get(&caller) else {
            debug!(peer = %caller, "answer from unknown participant dropped");
            return;
        };
        let Some(description) = event.description().cloned() else {
            self.emit_error(
                Some(caller),
                EngineError::MissingPayload(SignalingEventType::Answer),
            );
            return;
        };

        if let Err(e) = peer.renegotiate(description).await {
            warn!(peer = %caller, "answer handling failed: {e}");
            self.emit_error(Some(caller), e);
        }
    }

    async fn on_candidate(&mut self, caller: ParticipantId, event: SignalingEvent) {
        let Some(peer) = self.peers.get(&caller) else {
            debug!(peer = %caller, "candidate from unknown participant dropped");
            return;
        };
        let Some(candidate) = event.ice_candidate().cloned() else {
            self.emit_error(
                Some(caller),
                EngineError::MissingPayload(SignalingEventType::Candidate),
            );
            return;
        };

        if let Err(e) = peer.handle_remote_candidate(candidate).await {
            warn!(peer = %caller, "failed to add remote candidate: {e}");
            self.emit_error(Some(caller), e);
        }
    }

    async fn handle_connection_event(&mut self, event: PeerEvent) {
        let PeerEvent { participant, event } = event;

        if !self.peers.contains_key(&participant) {
            debug!(peer = %participant, "connection event for unknown participant dropped");
            return;
        }

        match event {
            ConnectionEvent::Message(payload) => {
                self.notify(SessionEvent::Message {
                    from: participant,
                    payload,
                });
            }

            ConnectionEvent::Track(track) => {
                self.notify(SessionEvent::Track {
                    from: participant,
                    track,
                });
            }

            ConnectionEvent::ConnectionStateChanged(state) => {
                debug!(peer = %participant, ?state, "connection state changed");
                if state.is_terminal() {
                    self.destroy_peer(&participant).await;
                }
            }

            ConnectionEvent::IceConnectionStateChanged(state) => {
                debug!(peer = %participant, ?state, "ice connection state changed");
                if state.is_terminal() {
                    self.destroy_peer(&participant).await;
                }
            }

            ConnectionEvent::LocalCandidate(candidate) => {
                if let Some(peer) = self.peers.get(&participant) {
                    peer.handle_local_candidate(candidate);
                }
            }

            ConnectionEvent::DataChannel(channel) => {
                if let Some(peer) = self.peers.get(&participant) {
                    peer.adopt_data_channel(channel).await;
                }
            }

            ConnectionEvent::SignalingStateChanged(state) => {
                if let Some(peer) = self.peers.get(&participant) {
                    peer.handle_signaling_state(state);
                }
            }

            ConnectionEvent::NegotiationNeeded => {
                let Some(peer) = self.peers.get(&participant) else {
                    return;
                };
                if let Err(e) = peer.negotiation_needed().await {
                    warn!(peer = %participant, "failed to initiate offer: {e}");
                    self.emit_error(Some(participant), e);
                }
            }
        }
    }

    /// Create and register a peer for `participant`, attaching the local
    /// tracks, and notify listeners. Returns false if the connection
    /// factory failed.
    async fn create_peer(&mut self, participant: ParticipantId) -> bool {
        let connection = match self
            .factory
            .create_connection(
                participant.clone(),
                &self.config.transport,
                self.conn_tx.clone(),
            )
            .await
        {
            Ok(connection) => connection,
            Err(e) => {
                error!(peer = %participant, "failed to create connection: {e}");
                self.emit_error(Some(participant), e.into());
                return false;
            }
        };

        for track in &self.config.local_tracks {
            if let Err(e) = connection.add_track(track) {
                warn!(peer = %participant, track = %track.id, "failed to attach local track: {e}");
            }
        }

        let peer = Peer::new(participant.clone(), self.peer_context(), connection);
        info!(room = %self.id, peer = %participant, "participant joined");
        self.peers.insert(participant.clone(), peer);
        self.notify(SessionEvent::Participant(participant));
        true
    }

    /// The connection reported a terminal state: remove the peer and close
    /// it, which fires the `"disconnected"` notification.
    async fn destroy_peer(&mut self, participant: &ParticipantId) {
        let Some(peer) = self.peers.remove(participant) else {
            return;
        };
        info!(room = %self.id, peer = %participant, "participant connection lost");
        peer.close().await;
    }

    fn peer_context(&self) -> PeerContext {
        PeerContext {
            room: self.id.clone(),
            local_participant: self.local_participant.clone(),
            outbound: self.outbound.clone(),
            events: self.events.clone(),
            offer_options: self.config.offer_options.clone(),
            channel_config: self.config.channel.clone(),
        }
    }

    fn notify(&self, event: SessionEvent) {
        self.events.dispatch(event.name(), &event);
    }

    fn emit_error(&self, from: Option<ParticipantId>, error: EngineError) {
        self.notify(SessionEvent::Error { from, error });
    }
}
