//! G29 output command encoding.
//!
//! All functions are pure and allocation-free.
//!
//! # Frame layout
//!
//! Every command is a 7-byte output report. Byte 0 selects the command;
//! effect parameters follow in bytes 2–3 and the tail is zero padding.
//!
//! ```text
//! reset (1/2)     F8 0A 00 00 00 00 00   revert mode upon USB reset
//! reset (2/2)     F8 09 05 01 01 00 00   switch to G29 mode, detach
//! constant force  14 00 ff 00 00 00 00   ff = round(v * 255)
//! autocenter      05 00 ss rr 00 00 00   ss/rr = round(x * 255)
//! force off       10 00 00 00 00 00 00
//! ```
//!
//! Effect strengths are normalized to `[0.0, 1.0]`. Anything outside that
//! range (NaN included) is rejected with
//! [`G29ProtocolError::ParameterOutOfRange`]; values are never clamped.
//!
//! After the reset pair the firmware recenters the rim mechanically and
//! ignores effect commands until [`RESET_SETTLE_DELAY`] has elapsed. The
//! encoders here do not wait; honouring the delay is the caller's job.
//!
//! [`RESET_SETTLE_DELAY`]: crate::ids::RESET_SETTLE_DELAY

#![deny(static_mut_refs)]

use crate::G29ProtocolError;
use crate::ids::{COMMAND_REPORT_LEN, opcodes};

/// A single 7-byte output frame.
pub type CommandBuffer = [u8; COMMAND_REPORT_LEN];

/// Lower bound of every normalized effect parameter.
pub const PARAM_MIN: f32 = 0.0;
/// Upper bound of every normalized effect parameter.
pub const PARAM_MAX: f32 = 1.0;

/// Validate a normalized parameter and scale it to a wire byte.
///
/// `parameter` names the argument in the returned error.
pub fn scale_unit(parameter: &'static str, value: f32) -> Result<u8, G29ProtocolError> {
    if !(PARAM_MIN..=PARAM_MAX).contains(&value) {
        return Err(G29ProtocolError::ParameterOutOfRange {
            parameter,
            value,
            min: PARAM_MIN,
            max: PARAM_MAX,
        });
    }
    // In range, so the product lies in [0, 255] and the cast is exact.
    Ok((value * 255.0).round() as u8)
}

/// Build the two reset frames, in send order.
pub fn build_reset_reports() -> [CommandBuffer; 2] {
    [
        [
            opcodes::VENDOR,
            opcodes::REVERT_MODE,
            0x00,
            0x00,
            0x00,
            0x00,
            0x00,
        ],
        [
            opcodes::VENDOR,
            opcodes::MODE_SWITCH,
            opcodes::MODE_G29,
            0x01,
            0x01,
            0x00,
            0x00,
        ],
    ]
}

/// Build a constant-force frame. `value` is the effect strength in `[0, 1]`.
pub fn build_constant_force_report(value: f32) -> Result<CommandBuffer, G29ProtocolError> {
    let scaled = scale_unit("val", value)?;
    Ok([opcodes::CONSTANT_FORCE, 0x00, scaled, 0x00, 0x00, 0x00, 0x00])
}

/// Build an autocenter frame. Both parameters are validated before either is
/// scaled, so a bad `rate` never yields a half-built frame.
pub fn build_autocenter_report(strength: f32, rate: f32) -> Result<CommandBuffer, G29ProtocolError> {
    let strength = scale_unit("strength", strength)?;
    let rate = scale_unit("rate", rate)?;
    Ok([opcodes::AUTOCENTER, 0x00, strength, rate, 0x00, 0x00, 0x00])
}

/// Build the frame that stops all forces.
pub fn build_force_off_report() -> CommandBuffer {
    [opcodes::FORCE_OFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
}

/// A command request, before encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum G29Command {
    Reset,
    ConstantForce(f32),
    Autocenter { strength: f32, rate: f32 },
    ForceOff,
}

impl G29Command {
    /// Encode into the frames to send, in order.
    pub fn encode(&self) -> Result<CommandFrames, G29ProtocolError> {
        match *self {
            G29Command::Reset => {
                let [first, second] = build_reset_reports();
                Ok(CommandFrames::pair(first, second))
            }
            G29Command::ConstantForce(v) => build_constant_force_report(v).map(CommandFrames::single),
            G29Command::Autocenter { strength, rate } => {
                build_autocenter_report(strength, rate).map(CommandFrames::single)
            }
            G29Command::ForceOff => Ok(CommandFrames::single(build_force_off_report())),
        }
    }

    /// Whether the firmware must settle after this command.
    pub fn requires_settle(&self) -> bool {
        matches!(self, G29Command::Reset)
    }

    /// Effects the firmware ignores while it settles after a reset.
    pub fn is_effect(&self) -> bool {
        matches!(
            self,
            G29Command::ConstantForce(_) | G29Command::Autocenter { .. }
        )
    }

    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            G29Command::Reset => "reset",
            G29Command::ConstantForce(_) => "constant_force",
            G29Command::Autocenter { .. } => "autocenter",
            G29Command::ForceOff => "force_off",
        }
    }
}

/// One or two encoded frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrames {
    frames: [CommandBuffer; 2],
    len: usize,
}

impl CommandFrames {
    fn single(frame: CommandBuffer) -> Self {
        Self {
            frames: [frame, [0u8; COMMAND_REPORT_LEN]],
            len: 1,
        }
    }

    fn pair(first: CommandBuffer, second: CommandBuffer) -> Self {
        Self {
            frames: [first, second],
            len: 2,
        }
    }

    pub fn as_slice(&self) -> &[CommandBuffer] {
        self.frames.get(..self.len).unwrap_or(&self.frames)
    }
}
