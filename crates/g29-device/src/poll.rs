//! Poll outcomes and the fixed-cadence poll driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use g29_hid_common::HidTransport;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::DeviceResult;
use crate::wheel::{G29Wheel, WheelSnapshot};

/// Whether a read is in flight on the wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollState {
    Idle,
    Polling,
}

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollOutcome {
    /// A 16-byte report arrived and replaced the snapshot.
    Updated,
    /// Nothing arrived within the timeout.
    Timeout,
    /// A report of the wrong length arrived and was dropped.
    Rejected { len: usize },
}

impl PollOutcome {
    pub fn is_update(self) -> bool {
        self == PollOutcome::Updated
    }
}

/// Per-outcome counters for a [`PollLoop`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    pub cycles: u64,
    pub updates: u64,
    pub timeouts: u64,
    pub rejected: u64,
}

impl PollStats {
    pub fn record(&mut self, outcome: PollOutcome) {
        self.cycles += 1;
        match outcome {
            PollOutcome::Updated => self.updates += 1,
            PollOutcome::Timeout => self.timeouts += 1,
            PollOutcome::Rejected { .. } => self.rejected += 1,
        }
    }
}

/// Drives [`G29Wheel::poll`] at a fixed cadence on the calling thread.
pub struct PollLoop<'a, T: HidTransport> {
    wheel: &'a G29Wheel<T>,
    cadence: Duration,
}

impl<'a, T: HidTransport> PollLoop<'a, T> {
    pub fn new(wheel: &'a G29Wheel<T>, cadence: Duration) -> Self {
        Self { wheel, cadence }
    }

    /// Poll until `stop` is raised or `deadline` passes.
    ///
    /// `on_cycle` sees the snapshot after every poll, updated or not. A
    /// transport error ends the run and is returned as is.
    pub fn run_until<F>(
        &self,
        stop: &AtomicBool,
        deadline: Option<Instant>,
        mut on_cycle: F,
    ) -> DeviceResult<PollStats>
    where
        F: FnMut(&WheelSnapshot, PollOutcome),
    {
        let mut stats = PollStats::default();
        debug!(cadence = ?self.cadence, "Poll loop started");

        loop {
            if stop.load(Ordering::Acquire) || deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }

            let started = Instant::now();
            let outcome = match self.wheel.poll() {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, cycles = stats.cycles, "Poll loop stopped on error");
                    return Err(e);
                }
            };
            stats.record(outcome);
            on_cycle(&self.wheel.snapshot(), outcome);

            let remaining = self.cadence.saturating_sub(started.elapsed());
            if !remaining.is_zero() {
                std::thread::sleep(remaining);
            }
        }

        debug!(
            cycles = stats.cycles,
            updates = stats.updates,
            timeouts = stats.timeouts,
            rejected = stats.rejected,
            "Poll loop finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_record() {
        let mut stats = PollStats::default();
        stats.record(PollOutcome::Updated);
        stats.record(PollOutcome::Timeout);
        stats.record(PollOutcome::Timeout);
        stats.record(PollOutcome::Rejected { len: 3 });
        assert_eq!(
            stats,
            PollStats {
                cycles: 4,
                updates: 1,
                timeouts: 2,
                rejected: 1,
            }
        );
    }

    #[test]
    fn test_outcome_is_update() {
        assert!(PollOutcome::Updated.is_update());
        assert!(!PollOutcome::Timeout.is_update());
        assert!(!PollOutcome::Rejected { len: 0 }.is_update());
    }
}
