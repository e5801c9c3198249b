//! Fuzzes the G29 input report decoder.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_g29_input
#![no_main]
use libfuzzer_sys::fuzz_target;
use racing_wheel_hid_g29_protocol::{
    Button, INPUT_REPORT_LEN, first_pressed_button, parse_input_report, probe_button,
};

fuzz_target!(|data: &[u8]| {
    // Must never panic on arbitrary bytes.
    let decoded = parse_input_report(data);
    assert_eq!(decoded.is_ok(), data.len() == INPUT_REPORT_LEN);

    // Partial probes and the precedence scan tolerate short buffers.
    for button in Button::ALL {
        let held = probe_button(data, button);
        if let Ok(state) = &decoded {
            assert_eq!(state.buttons.is_pressed(button), held);
        }
    }
    let first = first_pressed_button(data);
    if let Ok(state) = &decoded {
        assert_eq!(state.first_pressed, first);
    }
});
