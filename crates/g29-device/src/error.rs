use std::time::Duration;

use g29_hid_common::HidCommonError;
use racing_wheel_hid_g29_protocol::G29ProtocolError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Transport error: {0}")]
    Transport(#[from] HidCommonError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] G29ProtocolError),

    #[error("Wheel is settling after reset, {}ms remaining", .remaining.as_millis())]
    Settling { remaining: Duration },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DeviceError {
    /// The device went away and the caller should stop polling.
    pub fn is_transport_unavailable(&self) -> bool {
        matches!(self, DeviceError::Transport(e) if e.is_unavailable())
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;
