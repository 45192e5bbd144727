use std::sync::Arc;
use tokio::sync::mpsc;
use trellis_core::{ParticipantId, RoomId};
use trellis_engine::{DataChannelConfig, EventDispatcher, OfferOptions, Peer, PeerContext};

use crate::integration::init_tracing;
use crate::utils::{EventCapture, MockConnection};

#[tokio::test]
async fn test_close_idempotent() {
    init_tracing();

    let (conn_tx, _conn_rx) = mpsc::channel(8);
    let events = Arc::new(EventDispatcher::new());
    let notifications = EventCapture::attach(&events);
    let alice = ParticipantId::from("alice");
    let connection = MockConnection::new(alice.clone(), conn_tx);

    let peer = Peer::new(
        alice.clone(),
        PeerContext {
            room: RoomId::from("room1"),
            local_participant: ParticipantId::generate(),
            outbound: Arc::new(EventDispatcher::new()),
            events,
            offer_options: OfferOptions::default(),
            channel_config: DataChannelConfig::default(),
        },
        connection.clone(),
    );

    peer.close().await;
    peer.close().await;

    assert_eq!(notifications.disconnected(), vec![alice.clone(), alice]);
    assert!(connection.is_closed());
}
