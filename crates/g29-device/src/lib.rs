//! Stateful Logitech G29 wrapper.
//!
//! [`G29Wheel`] owns a [`g29_hid_common::HidTransport`], applies input
//! reports to a shared snapshot and sends force-feedback commands while
//! tracking the post-reset settle window. [`PollLoop`] drives polling at a
//! fixed cadence on the calling thread.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod poll;
pub mod wheel;

pub use config::{ConfigError, G29Config};
pub use error::{DeviceError, DeviceResult};
pub use poll::{PollLoop, PollOutcome, PollState, PollStats};
pub use wheel::{G29Wheel, WheelSnapshot};

pub use racing_wheel_hid_g29_protocol::{Axis, Button, ButtonState, ControllerState};
