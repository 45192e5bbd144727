
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use trellis_core::{ParticipantId, RoomId, SignalingEvent};
use trellis_engine::{EventDispatcher, SEND_EVENT, Session, SessionCommand, SessionConfig};

use crate::utils::{EventCapture, MockConnectionFactory, SignalCapture};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A spawned session plus every observation point the tests need.
pub struct TestSession {
    pub commands: mpsc::Sender<SessionCommand>,
    pub signals: SignalCapture,
    pub notifications: EventCapture,
    pub factory: Arc<MockConnectionFactory>,
    pub local_participant: ParticipantId,
    pub room: RoomId,
}

impl TestSession {
    /// Deliver an inbound signaling event to the running session.
    pub async fn signal(&self, event: SignalingEvent) {
        self.commands
            .send(SessionCommand::Signal(event))
            .await
            .expect("session loop is gone");
    }
}

pub fn create_test_session(room: &str) -> TestSession {
    init_tracing();
    let (command_tx, command_rx) = mpsc::channel(100);
    spawn_session(room, Arc::new(EventDispatcher::new()), command_tx, command_rx)
}

/// Two sessions in the same room with their outbound dispatchers
/// cross-wired, as if a relay forwarded every event to the other side.
pub fn create_linked_sessions(room: &str) -> (TestSession, TestSession) {
    init_tracing();

    let first_out = Arc::new(EventDispatcher::new());
    let second_out = Arc::new(EventDispatcher::new());
    let (first_tx, first_rx) = mpsc::channel(100);
    let (second_tx, second_rx) = mpsc::channel(100);

    let to_second = second_tx.clone();
    first_out.register(SEND_EVENT, move |event: &SignalingEvent| {
        let _ = to_second.try_send(SessionCommand::Signal(event.clone()));
    });
    let to_first = first_tx.clone();
    second_out.register(SEND_EVENT, move |event: &SignalingEvent| {
        let _ = to_first.try_send(SessionCommand::Signal(event.clone()));
    });

    let first = spawn_session(room, first_out, first_tx, first_rx);
    let second = spawn_session(room, second_out, second_tx, second_rx);
    (first, second)
}

fn spawn_session(
    room: &str,
    outbound: Arc<EventDispatcher<SignalingEvent>>,
    command_tx: mpsc::Sender<SessionCommand>,
    command_rx: mpsc::Receiver<SessionCommand>,
) -> TestSession {
    let signals = SignalCapture::attach(&outbound);
    let factory = Arc::new(MockConnectionFactory::default());

    let session = Session::new(
        RoomId::from(room),
        SessionConfig::default(),
        factory.clone(),
        outbound,
        command_rx,
    );
    let notifications = EventCapture::attach(&session.events());
    let local_participant = session.local_participant().clone();
    let room = session.id().clone();

    tokio::spawn(session.run());

    TestSession {
        commands: command_tx,
        signals,
        notifications,
        factory,
        local_participant,
        room,
    }
}
