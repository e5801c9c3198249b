//! Feeds arbitrary report sequences through the G29 wheel wrapper.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_g29_wheel
#![no_main]
use g29_hid_common::mock::MockHidTransport;
use libfuzzer_sys::fuzz_target;
use racing_wheel_g29_device::{G29Config, G29Wheel, PollOutcome};

fuzz_target!(|data: &[u8]| {
    let handle = MockHidTransport::new(0x046D, 0xC24F, "fuzz");
    // First byte of each chunk is its length, capped at 32.
    let mut rest = data;
    while let Some((&len, tail)) = rest.split_first() {
        let len = usize::from(len % 33).min(tail.len());
        let (chunk, next) = tail.split_at(len);
        handle.queue_read(chunk.to_vec());
        rest = next;
    }

    let wheel = G29Wheel::new(handle.clone(), G29Config::default());
    while handle.pending_reads() > 0 {
        let before = wheel.snapshot();
        match wheel.poll() {
            Ok(PollOutcome::Updated) => {}
            Ok(_) => assert_eq!(wheel.snapshot(), before),
            Err(_) => return,
        }
    }
});
