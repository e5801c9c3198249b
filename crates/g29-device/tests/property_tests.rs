use g29_hid_common::mock::MockHidTransport;
use proptest::prelude::*;
use racing_wheel_g29_device::{G29Config, G29Wheel, PollOutcome};

fn wheel() -> G29Wheel<MockHidTransport> {
    G29Wheel::new(
        MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0"),
        G29Config::default(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_wrong_length_never_changes_snapshot(
        seed in proptest::collection::vec(any::<u8>(), 16),
        data in proptest::collection::vec(any::<u8>(), 0..64usize)
            .prop_filter("not a full report", |d| d.len() != 16),
    ) {
        let wheel = wheel();
        prop_assert_eq!(wheel.apply_report(&seed).ok(), Some(PollOutcome::Updated));
        let before = wheel.snapshot();

        let outcome = wheel.apply_report(&data).ok();
        prop_assert_eq!(outcome, Some(PollOutcome::Rejected { len: data.len() }));
        prop_assert_eq!(wheel.snapshot(), before);
    }

    #[test]
    fn prop_same_report_is_idempotent(report in proptest::collection::vec(any::<u8>(), 16)) {
        let wheel = wheel();
        prop_assert_eq!(wheel.apply_report(&report).ok(), Some(PollOutcome::Updated));
        let first = wheel.snapshot().input;
        prop_assert_eq!(wheel.apply_report(&report).ok(), Some(PollOutcome::Updated));
        prop_assert_eq!(wheel.snapshot().input, first);
        prop_assert_eq!(wheel.snapshot().reports, 2);
    }

    #[test]
    fn prop_polled_report_matches_direct_decode(
        report in proptest::collection::vec(any::<u8>(), 16),
    ) {
        let handle = MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0");
        let wheel = G29Wheel::new(handle.clone(), G29Config::default());
        handle.queue_read(report.clone());

        prop_assert_eq!(wheel.poll().ok(), Some(PollOutcome::Updated));
        let decoded = racing_wheel_hid_g29_protocol::parse_input_report(&report).ok();
        prop_assert_eq!(Some(wheel.snapshot().input), decoded);
    }
}
