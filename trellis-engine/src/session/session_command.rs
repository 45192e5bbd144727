use bytes::Bytes;
use trellis_core::SignalingEvent;

/// Commands accepted by a running session's event loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// An inbound signaling event delivered by the external transport.
    Signal(SignalingEvent),
    /// Send a payload to every connected peer's data channel.
    Broadcast(Bytes),
    /// Announce departure and tear down every peer.
    Disconnect,
}
