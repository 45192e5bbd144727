use crate::connection::ConnectionError;
use thiserror::Error;
use trellis_core::SignalingEventType;

/// Engine-level failure, surfaced to the application as an `"error"`
/// notification and never propagated past the session boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("{0} event carried no usable payload")]
    MissingPayload(SignalingEventType),
}
