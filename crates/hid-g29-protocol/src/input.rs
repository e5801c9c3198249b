//! G29 input report decoding.
//!
//! All functions are pure and allocation-free. Out-of-bounds reads are never
//! performed: full decodes are gated on the exact report length and
//! single-button probes go through `slice::get`.

#![deny(static_mut_refs)]

use serde::Serialize;

use crate::G29ProtocolError;
use crate::ids::{INPUT_REPORT_LEN, STEERING_SENTINEL, offsets};
use crate::types::{Button, ButtonState, ControllerState};

/// A complete 16-byte input report.
pub type RawReport = [u8; INPUT_REPORT_LEN];

/// Everything one input report says about the wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct G29InputState {
    pub axes: ControllerState,
    pub buttons: ButtonState,
    /// First match of the precedence scan. Convenience projection only; use
    /// `buttons` to ask whether a given button is held.
    pub first_pressed: Option<Button>,
}

/// Recover steering displacement from the two steering bytes.
///
/// Both bytes zero yields the 255 sentinel. Otherwise the result is the
/// absolute difference; turn direction is discarded.
pub fn compute_steering(a: u8, b: u8) -> u8 {
    if a == 0 && b == 0 {
        return STEERING_SENTINEL;
    }
    a.abs_diff(b)
}

/// Decode the four analog axes.
pub fn decode_axes(report: &RawReport) -> ControllerState {
    ControllerState {
        steering: compute_steering(report[offsets::STEERING_A], report[offsets::STEERING_B]),
        throttle: report[offsets::THROTTLE],
        brake: report[offsets::BRAKE],
        clutch: report[offsets::CLUTCH],
    }
}

/// Evaluate every button pattern independently.
///
/// Several buttons may read as held at once; face-button masks and D-pad
/// values share bits in byte 0.
pub fn decode_buttons(report: &RawReport) -> ButtonState {
    let mut buttons = ButtonState::new();
    for button in Button::ALL {
        buttons.set(button, probe_button(report, button));
    }
    buttons
}

/// Masked test of one button against a possibly short buffer.
///
/// Returns `false` when the buffer does not reach the button's byte.
pub fn probe_button(data: &[u8], button: Button) -> bool {
    let pattern = button.pattern();
    data.get(pattern.offset)
        .is_some_and(|byte| pattern.matches(*byte))
}

/// Precedence scan using whole-byte equality.
///
/// Walks [`Button::ALL`] in order and returns the first button whose byte
/// equals its pattern value. The scan stops with `None` at the first button
/// whose byte lies past the end of `data`.
pub fn first_pressed_button(data: &[u8]) -> Option<Button> {
    for button in Button::ALL {
        let pattern = button.pattern();
        let byte = data.get(pattern.offset)?;
        if pattern.matches_exactly(*byte) {
            return Some(button);
        }
    }
    None
}

/// Decode a complete report.
pub fn decode_report(report: &RawReport) -> G29InputState {
    G29InputState {
        axes: decode_axes(report),
        buttons: decode_buttons(report),
        first_pressed: first_pressed_button(report),
    }
}

/// Decode a report of unknown length.
///
/// Anything other than exactly 16 bytes is rejected with
/// [`G29ProtocolError::InvalidReportLength`]; callers keep their previous
/// state in that case.
pub fn parse_input_report(data: &[u8]) -> Result<G29InputState, G29ProtocolError> {
    let Ok(report) = <&RawReport>::try_from(data) else {
        return Err(G29ProtocolError::InvalidReportLength {
            expected: INPUT_REPORT_LEN,
            actual: data.len(),
        });
    };
    Ok(decode_report(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn report_with(first: u8, fill: u8) -> RawReport {
        let mut r = [fill; INPUT_REPORT_LEN];
        r[0] = first;
        r
    }

    #[test]
    fn test_steering_sentinel_when_both_zero() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(compute_steering(0, 0), 255);
        Ok(())
    }

    #[test]
    fn test_steering_absolute_difference() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(compute_steering(200, 50), 150);
        assert_eq!(compute_steering(50, 200), 150);
        assert_eq!(compute_steering(0, 255), 255);
        assert_eq!(compute_steering(7, 7), 0, "equal non-zero bytes read as zero displacement");
        Ok(())
    }

    #[test]
    fn test_axes_passthrough() -> Result<(), Box<dyn std::error::Error>> {
        let mut r = [0u8; INPUT_REPORT_LEN];
        r[4] = 0x10;
        r[5] = 0x90;
        r[6] = 0x11;
        r[7] = 0x22;
        r[8] = 0x33;
        let axes = decode_axes(&r);
        assert_eq!(axes.steering, 0x80);
        assert_eq!(axes.throttle, 0x11);
        assert_eq!(axes.brake, 0x22);
        assert_eq!(axes.clutch, 0x33);
        Ok(())
    }

    #[test]
    fn test_x_does_not_trigger_square() -> Result<(), Box<dyn std::error::Error>> {
        let buttons = decode_buttons(&report_with(0x18, 0x05));
        assert!(buttons.is_pressed(Button::X));
        assert!(!buttons.is_pressed(Button::Square));

        let buttons = decode_buttons(&report_with(0x28, 0x05));
        assert!(buttons.is_pressed(Button::Square));
        assert!(!buttons.is_pressed(Button::X));
        Ok(())
    }

    #[test]
    fn test_all_zero_report_is_dpad_up() -> Result<(), Box<dyn std::error::Error>> {
        let state = decode_report(&[0u8; INPUT_REPORT_LEN]);
        assert_eq!(state.first_pressed, Some(Button::DPadUp));
        assert!(state.buttons.is_pressed(Button::DPadUp));
        assert_eq!(state.axes.steering, 255);
        Ok(())
    }

    #[test]
    fn test_shoulder_byte_bits() -> Result<(), Box<dyn std::error::Error>> {
        let mut r = [0x08u8; INPUT_REPORT_LEN];
        r[1] = 0xFF;
        r[2] = 0x80;
        r[3] = 0x19;
        let buttons = decode_buttons(&r);
        for b in [
            Button::L2,
            Button::R2,
            Button::L3,
            Button::R3,
            Button::LeftPaddle,
            Button::RightPaddle,
            Button::Share,
            Button::Options,
            Button::PlusButton,
            Button::MinusButton,
            Button::RotaryDialPress,
            Button::PS,
        ] {
            assert!(buttons.is_pressed(b), "{b} should be held");
        }
        Ok(())
    }

    #[test]
    fn test_first_pressed_precedence() -> Result<(), Box<dyn std::error::Error>> {
        // Byte 0 = 0x08 matches no face/hat value exactly; byte 1 = L2.
        let mut r = [0u8; INPUT_REPORT_LEN];
        r[0] = 0x08;
        r[1] = 0x08;
        assert_eq!(first_pressed_button(&r), Some(Button::L2));

        // Face button wins over shoulder.
        r[0] = 0x48;
        assert_eq!(first_pressed_button(&r), Some(Button::Circle));

        // Hat neutral, nothing held.
        let r = [0x08, 0x00, 0x00, 0x00];
        assert_eq!(first_pressed_button(&r), None);
        Ok(())
    }

    #[test]
    fn test_first_pressed_ignores_chords() -> Result<(), Box<dyn std::error::Error>> {
        // L2 + R2 together: bitmask sees both, exact scan sees neither.
        let mut r = [0x08u8; INPUT_REPORT_LEN];
        r[1] = 0x0C;
        r[2] = 0x00;
        r[3] = 0x00;
        let state = decode_report(&r);
        assert!(state.buttons.is_pressed(Button::L2));
        assert!(state.buttons.is_pressed(Button::R2));
        assert_eq!(state.first_pressed, None);
        Ok(())
    }

    #[test]
    fn test_first_pressed_short_buffers() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(first_pressed_button(&[]), None);
        assert_eq!(first_pressed_button(&[0x18]), Some(Button::X));
        // A lone zero byte would be DPadUp, but the L2 check needs byte 1 first.
        assert_eq!(first_pressed_button(&[0x00]), None);
        assert_eq!(first_pressed_button(&[0x37]), None);
        assert_eq!(first_pressed_button(&[0x08, 0x02, 0x00]), None);
        assert_eq!(first_pressed_button(&[0x08, 0x02, 0x00, 0x00]), Some(Button::LeftPaddle));
        Ok(())
    }

    #[test]
    fn test_probe_button_short_buffer() -> Result<(), Box<dyn std::error::Error>> {
        assert!(probe_button(&[0x18], Button::X));
        assert!(!probe_button(&[0x18], Button::PS));
        assert!(!probe_button(&[], Button::DPadUp));
        Ok(())
    }

    #[test]
    fn test_parse_rejects_wrong_length() -> Result<(), Box<dyn std::error::Error>> {
        let err = parse_input_report(&[0u8; 15]).err().ok_or("15 bytes must be rejected")?;
        assert!(matches!(
            err,
            G29ProtocolError::InvalidReportLength {
                expected: 16,
                actual: 15
            }
        ));
        assert!(parse_input_report(&[0u8; 17]).is_err());
        assert!(parse_input_report(&[]).is_err());
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn prop_steering_symmetric(a: u8, b: u8) {
            prop_assert_eq!(compute_steering(a, b), compute_steering(b, a));
        }

        #[test]
        fn prop_steering_is_abs_diff_unless_both_zero(a: u8, b: u8) {
            prop_assume!(a != 0 || b != 0);
            let expected = (i16::from(a) - i16::from(b)).unsigned_abs();
            prop_assert_eq!(u16::from(compute_steering(a, b)), expected);
        }

        #[test]
        fn prop_decode_idempotent(bytes in proptest::array::uniform16(any::<u8>())) {
            prop_assert_eq!(decode_report(&bytes), decode_report(&bytes));
        }

        #[test]
        fn prop_only_sixteen_bytes_parse(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(parse_input_report(&data).is_ok(), data.len() == INPUT_REPORT_LEN);
        }

        #[test]
        fn prop_first_pressed_agrees_with_bitmask(bytes in proptest::array::uniform16(any::<u8>())) {
            let state = decode_report(&bytes);
            if let Some(b) = state.first_pressed {
                prop_assert!(state.buttons.is_pressed(b), "{} reported first but not held", b);
            }
        }
    }
}
