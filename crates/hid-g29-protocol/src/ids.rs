//! G29 USB identity, report sizes, byte offsets and command opcodes.

#![deny(static_mut_refs)]

use core::time::Duration;

/// Logitech USB vendor ID.
pub const LOGITECH_VENDOR_ID: u16 = 0x046D;

/// G29 racing wheel (PlayStation/PC mode).
pub const G29_PRODUCT_ID: u16 = 0xC24F;

/// Wire size of a G29 input report.
pub const INPUT_REPORT_LEN: usize = 16;

/// Wire size of every G29 output command frame.
pub const COMMAND_REPORT_LEN: usize = 7;

/// Time the firmware needs to finish mechanical recentering after a reset.
pub const RESET_SETTLE_DELAY: Duration = Duration::from_secs(10);

/// Byte offsets inside the 16-byte input report.
pub mod offsets {
    /// Face buttons (high nibble) and D-pad hat (low nibble).
    pub const FACE_AND_DPAD: usize = 0;
    /// Shoulder, stick, paddle, Share and Options bits.
    pub const SHOULDER: usize = 1;
    /// Plus button bit.
    pub const PLUS: usize = 2;
    /// Minus, rotary dial press and PS bits.
    pub const DIAL_AND_PS: usize = 3;
    /// First half of the steering magnitude/direction pair.
    pub const STEERING_A: usize = 4;
    /// Second half of the steering magnitude/direction pair.
    pub const STEERING_B: usize = 5;
    /// Throttle pedal.
    pub const THROTTLE: usize = 6;
    /// Brake pedal.
    pub const BRAKE: usize = 7;
    /// Clutch pedal.
    pub const CLUTCH: usize = 8;
}

/// Opcode bytes at position 0 (and 1 for vendor frames) of an output frame.
pub mod opcodes {
    /// Vendor command prefix used by both reset frames.
    pub const VENDOR: u8 = 0xF8;
    /// Reset step 1: revert mode upon USB reset.
    pub const REVERT_MODE: u8 = 0x0A;
    /// Reset step 2: extended mode switch.
    pub const MODE_SWITCH: u8 = 0x09;
    /// Mode identifier selecting G29 native mode.
    pub const MODE_G29: u8 = 0x05;
    /// Constant force effect.
    pub const CONSTANT_FORCE: u8 = 0x14;
    /// Autocenter spring.
    pub const AUTOCENTER: u8 = 0x05;
    /// Stop all forces.
    pub const FORCE_OFF: u8 = 0x10;
}

/// Value reported for steering when both steering bytes are zero.
pub const STEERING_SENTINEL: u8 = 0xFF;

/// Power-on value of every axis before the first report arrives.
pub const AXIS_DEFAULT: u8 = 0xFF;
