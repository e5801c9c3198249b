//! Transport abstractions for talking to a USB HID wheel.
//!
//! The protocol layer never touches a device directly; it goes through
//! [`HidTransport`]. [`hidapi_transport::HidApiTransport`] drives real
//! hardware and [`mock::MockHidTransport`] scripts reads for tests.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod device_info;
pub mod hid_traits;
pub mod hidapi_transport;

pub use device_info::*;
pub use hid_traits::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidCommonError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenError(String),

    #[error("Failed to read from device: {0}")]
    ReadError(String),

    #[error("Failed to write to device: {0}")]
    WriteError(String),

    #[error("Short write: sent {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },

    #[error("Device disconnected")]
    Disconnected,
}

impl HidCommonError {
    /// Whether the device can no longer be used.
    ///
    /// Failed transfers count: hidapi reports an unplugged or revoked device
    /// as a plain read or write error. A short write does not, since the
    /// device answered.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            HidCommonError::DeviceNotFound(_)
                | HidCommonError::OpenError(_)
                | HidCommonError::ReadError(_)
                | HidCommonError::WriteError(_)
                | HidCommonError::Disconnected
        )
    }
}

pub type HidCommonResult<T> = Result<T, HidCommonError>;
