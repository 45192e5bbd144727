use std::sync::Arc;
use tokio::sync::mpsc;
use trellis_core::{ParticipantId, RoomId, SessionDescription, SignalingEventType};
use trellis_engine::{
    ConnectionHandle, DataChannelConfig, EventDispatcher, OfferOptions, Peer, PeerContext,
    SignalingState,
};

use crate::integration::init_tracing;
use crate::utils::{MockConnection, SIGNAL_TIMEOUT_MS, SignalCapture, wait_until};

/// A local offer that resolves after a remote offer has already been
/// committed must be dropped without being applied or emitted.
#[tokio::test]
async fn test_stale_offer_abandoned() {
    init_tracing();

    let (conn_tx, _conn_rx) = mpsc::channel(64);
    let outbound = Arc::new(EventDispatcher::new());
    let signals = SignalCapture::attach(&outbound);
    let alice = ParticipantId::from("alice");
    let connection = MockConnection::new(alice.clone(), conn_tx);
    let offer_gate = connection.gate_offers();
    let answer_gate = connection.gate_answers();

    let peer = Arc::new(Peer::new(
        alice,
        PeerContext {
            room: RoomId::from("room1"),
            local_participant: ParticipantId::generate(),
            outbound,
            events: Arc::new(EventDispatcher::new()),
            offer_options: OfferOptions::default(),
            channel_config: DataChannelConfig::default(),
        },
        connection.clone(),
    ));

    // Local negotiation starts and stalls inside create_offer.
    let local = tokio::spawn({
        let peer = peer.clone();
        async move { peer.negotiation_needed().await }
    });
    wait_until(|| connection.offer_calls() == 1, SIGNAL_TIMEOUT_MS)
        .await
        .expect("local offer never started");

    // Meanwhile the remote offer lands and is committed.
    let remote = tokio::spawn({
        let peer = peer.clone();
        async move {
            peer.renegotiate(SessionDescription::offer("remote-offer"))
                .await
        }
    });
    wait_until(
        || connection.signaling_state() == SignalingState::HaveRemoteOffer,
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("remote offer not committed");

    // Let the stalled local offer resolve: it must be abandoned silently.
    offer_gate.add_permits(1);
    local
        .await
        .unwrap()
        .expect("abandoning a stale offer must not error");
    assert_eq!(signals.count_of(SignalingEventType::Offer), 0);

    answer_gate.add_permits(1);
    remote.await.unwrap().expect("answering must not error");

    assert_eq!(signals.count_of(SignalingEventType::Answer), 1);
    assert_eq!(connection.signaling_state(), SignalingState::Stable);
    assert_eq!(connection.rollbacks(), 0);
    assert!(!peer.is_negotiating());
}
