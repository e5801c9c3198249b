//! Logitech G29 HID protocol: input report decoding and command encoding.
//!
//! This crate is intentionally I/O-free and allocation-free on hot paths.
//! It provides pure functions and types that can be tested without hardware.
//!
//! - [`input`] turns a 16-byte input report into axes, a button map and a
//!   "first pressed" label.
//! - [`output`] builds the 7-byte reset, constant-force, autocenter and
//!   force-off frames.

#![deny(static_mut_refs)]
#![deny(clippy::unwrap_used)]

pub mod ids;
pub mod input;
pub mod output;
pub mod types;

pub use ids::{
    COMMAND_REPORT_LEN, G29_PRODUCT_ID, INPUT_REPORT_LEN, LOGITECH_VENDOR_ID, RESET_SETTLE_DELAY,
};
pub use input::{
    G29InputState, RawReport, compute_steering, decode_axes, decode_buttons, decode_report,
    first_pressed_button, parse_input_report, probe_button,
};
pub use output::{
    CommandBuffer, CommandFrames, G29Command, build_autocenter_report,
    build_constant_force_report, build_force_off_report, build_reset_reports, scale_unit,
};
pub use types::{Axis, Button, ButtonPattern, ButtonState, ControllerState};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum G29ProtocolError {
    #[error("Invalid report length: expected {expected}, got {actual}")]
    InvalidReportLength { expected: usize, actual: usize },

    #[error("Parameter '{parameter}' value {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("Unknown button: {0}")]
    UnknownButton(String),
}
