//! G29 state model: axes, buttons and their bit patterns.

#![deny(static_mut_refs)]

use core::fmt;
use core::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::G29ProtocolError;
use crate::ids::{AXIS_DEFAULT, offsets};

/// Analog input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Steering,
    Throttle,
    Brake,
    Clutch,
}

impl Axis {
    /// Every axis, in report order.
    pub const ALL: [Axis; 4] = [Axis::Steering, Axis::Throttle, Axis::Brake, Axis::Clutch];

    /// Lower-case label used in logs and console output.
    pub fn name(self) -> &'static str {
        match self {
            Axis::Steering => "steering",
            Axis::Throttle => "throttle",
            Axis::Brake => "brake",
            Axis::Clutch => "clutch",
        }
    }
}

/// One of the 20 discrete G29 buttons.
///
/// Declaration order is the precedence order of the first-pressed scan
/// (see [`crate::input::first_pressed_button`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Button {
    X,
    Square,
    Triangle,
    Circle,
    L2,
    R2,
    L3,
    R3,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    RotaryDialPress,
    PlusButton,
    MinusButton,
    LeftPaddle,
    RightPaddle,
    Share,
    Options,
    PS,
}

/// Byte test identifying a button inside an input report.
///
/// A button is held when `report[offset] & mask == value`. The first-pressed
/// scan instead compares the whole byte against `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPattern {
    pub offset: usize,
    pub mask: u8,
    pub value: u8,
}

impl ButtonPattern {
    const fn bit(offset: usize, mask: u8) -> Self {
        Self {
            offset,
            mask,
            value: mask,
        }
    }

    const fn hat(value: u8) -> Self {
        Self {
            offset: offsets::FACE_AND_DPAD,
            mask: 0x0F,
            value,
        }
    }

    /// Masked test used for the authoritative button map.
    pub fn matches(self, byte: u8) -> bool {
        byte & self.mask == self.value
    }

    /// Whole-byte test used by the first-pressed scan.
    pub fn matches_exactly(self, byte: u8) -> bool {
        byte == self.value
    }
}

impl Button {
    /// Every button, in first-pressed precedence order.
    pub const ALL: [Button; 20] = [
        Button::X,
        Button::Square,
        Button::Triangle,
        Button::Circle,
        Button::L2,
        Button::R2,
        Button::L3,
        Button::R3,
        Button::DPadUp,
        Button::DPadDown,
        Button::DPadLeft,
        Button::DPadRight,
        Button::RotaryDialPress,
        Button::PlusButton,
        Button::MinusButton,
        Button::LeftPaddle,
        Button::RightPaddle,
        Button::Share,
        Button::Options,
        Button::PS,
    ];

    /// Where and how this button is encoded in an input report.
    pub const fn pattern(self) -> ButtonPattern {
        use offsets::{DIAL_AND_PS, FACE_AND_DPAD, PLUS, SHOULDER};
        match self {
            Button::X => ButtonPattern::bit(FACE_AND_DPAD, 0x18),
            Button::Square => ButtonPattern::bit(FACE_AND_DPAD, 0x28),
            Button::Triangle => ButtonPattern::bit(FACE_AND_DPAD, 0x88),
            Button::Circle => ButtonPattern::bit(FACE_AND_DPAD, 0x48),
            Button::L2 => ButtonPattern::bit(SHOULDER, 0x08),
            Button::R2 => ButtonPattern::bit(SHOULDER, 0x04),
            Button::L3 => ButtonPattern::bit(SHOULDER, 0x80),
            Button::R3 => ButtonPattern::bit(SHOULDER, 0x40),
            Button::DPadUp => ButtonPattern::hat(0x00),
            Button::DPadDown => ButtonPattern::hat(0x04),
            Button::DPadLeft => ButtonPattern::hat(0x06),
            Button::DPadRight => ButtonPattern::hat(0x02),
            Button::RotaryDialPress => ButtonPattern::bit(DIAL_AND_PS, 0x08),
            Button::PlusButton => ButtonPattern::bit(PLUS, 0x80),
            Button::MinusButton => ButtonPattern::bit(DIAL_AND_PS, 0x01),
            Button::LeftPaddle => ButtonPattern::bit(SHOULDER, 0x02),
            Button::RightPaddle => ButtonPattern::bit(SHOULDER, 0x01),
            Button::Share => ButtonPattern::bit(SHOULDER, 0x10),
            Button::Options => ButtonPattern::bit(SHOULDER, 0x20),
            Button::PS => ButtonPattern::bit(DIAL_AND_PS, 0x10),
        }
    }

    /// Canonical button label (e.g. `"DPadUp"`, `"PlusButton"`).
    pub fn name(self) -> &'static str {
        match self {
            Button::X => "X",
            Button::Square => "Square",
            Button::Triangle => "Triangle",
            Button::Circle => "Circle",
            Button::L2 => "L2",
            Button::R2 => "R2",
            Button::L3 => "L3",
            Button::R3 => "R3",
            Button::DPadUp => "DPadUp",
            Button::DPadDown => "DPadDown",
            Button::DPadLeft => "DPadLeft",
            Button::DPadRight => "DPadRight",
            Button::RotaryDialPress => "RotaryDialPress",
            Button::PlusButton => "PlusButton",
            Button::MinusButton => "MinusButton",
            Button::LeftPaddle => "LeftPaddle",
            Button::RightPaddle => "RightPaddle",
            Button::Share => "Share",
            Button::Options => "Options",
            Button::PS => "PS",
        }
    }

    /// Look a button up by its exact label. Any other spelling is unknown.
    pub fn from_name(name: &str) -> Option<Button> {
        Button::ALL.into_iter().find(|b| b.name() == name)
    }

    fn bit(self) -> u32 {
        1u32 << (self as u8)
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Button {
    type Err = G29ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Button::from_name(s).ok_or_else(|| G29ProtocolError::UnknownButton(s.to_string()))
    }
}

/// Analog axis readings from the most recent report.
///
/// Values are raw transducer bytes; no inversion or scaling is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerState {
    /// Absolute steering displacement, or 255 when centered / not yet known.
    pub steering: u8,
    pub throttle: u8,
    pub brake: u8,
    pub clutch: u8,
}

impl ControllerState {
    /// Read an axis by tag.
    pub fn axis(&self, axis: Axis) -> u8 {
        match axis {
            Axis::Steering => self.steering,
            Axis::Throttle => self.throttle,
            Axis::Brake => self.brake,
            Axis::Clutch => self.clutch,
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            steering: AXIS_DEFAULT,
            throttle: AXIS_DEFAULT,
            brake: AXIS_DEFAULT,
            clutch: AXIS_DEFAULT,
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Steering: {} | Throttle: {} | Brake: {} | Clutch: {}",
            self.steering, self.throttle, self.brake, self.clutch
        )
    }
}

/// Pressed/released flag for every [`Button`], packed one bit per button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ButtonState {
    bits: u32,
}

impl ButtonState {
    /// All buttons released.
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.bits & button.bit() != 0
    }

    /// Name-keyed lookup. Unknown names read as not pressed.
    pub fn is_pressed_by_name(&self, name: &str) -> bool {
        Button::from_name(name).is_some_and(|b| self.is_pressed(b))
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.bits |= button.bit();
        } else {
            self.bits &= !button.bit();
        }
    }

    /// Held buttons in precedence order.
    pub fn pressed(&self) -> impl Iterator<Item = Button> + '_ {
        Button::ALL.into_iter().filter(move |b| self.is_pressed(*b))
    }

    pub fn pressed_count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl Serialize for ButtonState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Button::ALL.len()))?;
        for button in Button::ALL {
            map.serialize_entry(button.name(), &self.is_pressed(button))?;
        }
        map.end()
    }
}
