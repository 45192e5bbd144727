use trellis_core::{ParticipantId, SessionDescription, SignalingEvent, SignalingEventType};
use trellis_engine::{ConnectionEvent, ConnectionHandle, SignalingState};

use crate::integration::create_test_session;
use crate::utils::{SIGNAL_TIMEOUT_MS, wait_until};

#[tokio::test]
async fn test_glare_rollback() {
    let session = create_test_session("room1");
    let alice = ParticipantId::from("alice");

    session
        .signal(SignalingEvent::connect(alice.clone(), session.room.clone()))
        .await;
    wait_until(|| session.factory.created() == 1, SIGNAL_TIMEOUT_MS)
        .await
        .expect("peer not created");
    let connection = session.factory.connection_for(&alice).unwrap();

    // Our side starts negotiating first.
    connection.emit(ConnectionEvent::NegotiationNeeded).await;
    wait_until(
        || session.signals.count_of(SignalingEventType::Offer) == 1,
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("no local offer emitted");
    assert_eq!(connection.signaling_state(), SignalingState::HaveLocalOffer);

    // The remote side offered at the same time; this side must yield.
    session
        .signal(SignalingEvent::offer(
            alice.clone(),
            session.local_participant.clone(),
            session.room.clone(),
            SessionDescription::offer("remote-offer"),
        ))
        .await;

    wait_until(
        || session.signals.count_of(SignalingEventType::Answer) == 1,
        SIGNAL_TIMEOUT_MS,
    )
    .await
    .expect("no answer after glare");

    assert_eq!(connection.rollbacks(), 1);
    assert_eq!(connection.signaling_state(), SignalingState::Stable);
    assert_eq!(connection.remote_description().unwrap().sdp, "remote-offer");
    // The abandoned local offer is never re-sent.
    assert_eq!(session.signals.count_of(SignalingEventType::Offer), 1);
    assert!(session.notifications.errors().is_empty());
}
