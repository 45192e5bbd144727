mod connection_config;
mod connection_error;
mod connection_event;
mod connection_handle;

pub use connection_config::*;
pub use connection_error::*;
pub use connection_event::*;
pub use connection_handle::*;
