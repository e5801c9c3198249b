//! Fuzzes the G29 command encoders with arbitrary float parameters.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_g29_output
#![no_main]
use libfuzzer_sys::fuzz_target;
use racing_wheel_hid_g29_protocol::{
    COMMAND_REPORT_LEN, G29Command, build_autocenter_report, build_constant_force_report,
};

fuzz_target!(|data: &[u8]| {
    let Some((head, tail)) = data.split_first_chunk::<4>() else {
        return;
    };
    let value = f32::from_le_bytes(*head);
    let rate = tail
        .first_chunk::<4>()
        .map_or(0.0, |bytes| f32::from_le_bytes(*bytes));

    let in_range = (0.0..=1.0).contains(&value);
    let constant = build_constant_force_report(value);
    assert_eq!(constant.is_ok(), in_range);

    let autocenter = build_autocenter_report(value, rate);
    assert_eq!(
        autocenter.is_ok(),
        in_range && (0.0..=1.0).contains(&rate)
    );

    for command in [
        G29Command::ConstantForce(value),
        G29Command::Autocenter { strength: value, rate },
    ] {
        if let Ok(frames) = command.encode() {
            for frame in frames.as_slice() {
                assert_eq!(frame.len(), COMMAND_REPORT_LEN);
            }
        }
    }
});
