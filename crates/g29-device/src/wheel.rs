//! Stateful G29 wrapper over a [`HidTransport`].
//!
//! The wrapper owns the transport and the latest decoded snapshot. One read
//! is in flight at a time (the transport sits behind a mutex) and snapshot
//! readers never observe a half-applied report.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use g29_hid_common::{HidCommonError, HidDeviceInfo, HidTransport};
use parking_lot::{Mutex, RwLock};
use racing_wheel_hid_g29_protocol::{
    Button, ButtonState, CommandBuffer, ControllerState, G29Command, G29InputState,
    G29ProtocolError, parse_input_report,
};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::G29Config;
use crate::error::{DeviceError, DeviceResult};
use crate::poll::{PollOutcome, PollState};

/// Read buffer size. Larger than a G29 report so oversized reports show up
/// with their real length instead of being cut to 16 bytes.
const READ_BUFFER_LEN: usize = 64;

/// Latest decoded report plus a count of how many have been applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WheelSnapshot {
    #[serde(flatten)]
    pub input: G29InputState,
    pub reports: u64,
}

impl WheelSnapshot {
    pub fn state(&self) -> ControllerState {
        self.input.axes
    }

    pub fn buttons(&self) -> ButtonState {
        self.input.buttons
    }

    pub fn first_pressed(&self) -> Option<Button> {
        self.input.first_pressed
    }
}

/// Clears the polling flag when a poll ends, including on early return.
struct PollingGuard<'a>(&'a AtomicBool);

impl<'a> PollingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for PollingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct G29Wheel<T: HidTransport> {
    transport: Mutex<T>,
    info: HidDeviceInfo,
    snapshot: RwLock<WheelSnapshot>,
    polling: AtomicBool,
    settle_until: Mutex<Option<Instant>>,
    config: G29Config,
}

impl<T: HidTransport> G29Wheel<T> {
    pub fn new(transport: T, config: G29Config) -> Self {
        let info = transport.device_info().clone();
        debug!(device = %info.usb_id(), path = %info.path, "Created G29 wheel wrapper");
        Self {
            transport: Mutex::new(transport),
            info,
            snapshot: RwLock::new(WheelSnapshot::default()),
            polling: AtomicBool::new(false),
            settle_until: Mutex::new(None),
            config,
        }
    }

    pub fn config(&self) -> &G29Config {
        &self.config
    }

    pub fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    /// Wait up to the connect timeout for the first report, then reset if
    /// the config asks for it.
    pub fn connect(&self) -> DeviceResult<PollOutcome> {
        info!(
            device = %self.info.display_name(),
            timeout = ?self.config.connect_timeout(),
            "Connecting to G29"
        );
        let outcome = self.poll_with_timeout(self.config.connect_timeout())?;
        if outcome != PollOutcome::Updated {
            warn!(?outcome, "No input report received while connecting");
        }
        if self.config.reset_on_connect {
            self.reset()?;
        }
        Ok(outcome)
    }

    pub fn poll(&self) -> DeviceResult<PollOutcome> {
        self.poll_with_timeout(self.config.poll_timeout())
    }

    /// Read at most one report and apply it.
    ///
    /// Timeouts and wrong-length reports leave the snapshot untouched and
    /// are reported as outcomes. Transport failures are returned as errors.
    pub fn poll_with_timeout(&self, timeout: Duration) -> DeviceResult<PollOutcome> {
        let mut transport = self.transport.lock();
        let _polling = PollingGuard::enter(&self.polling);

        let mut buf = [0u8; READ_BUFFER_LEN];
        let read = match transport.read_report_timeout(&mut buf, timeout) {
            Ok(n) => n,
            Err(e) => {
                warn!(device = %self.info.usb_id(), error = %e, "Read failed");
                return Err(e.into());
            }
        };

        if read == 0 {
            trace!(?timeout, "No report before timeout");
            return Ok(PollOutcome::Timeout);
        }
        let data = buf.get(..read).unwrap_or(&buf);
        self.apply_report(data)
    }

    /// Decode `data` and replace the snapshot if it is a full report.
    pub fn apply_report(&self, data: &[u8]) -> DeviceResult<PollOutcome> {
        match parse_input_report(data) {
            Ok(input) => {
                trace!(
                    steering = input.axes.steering,
                    throttle = input.axes.throttle,
                    brake = input.axes.brake,
                    clutch = input.axes.clutch,
                    held = input.buttons.pressed_count(),
                    "Applied input report"
                );
                let mut snapshot = self.snapshot.write();
                snapshot.input = input;
                snapshot.reports = snapshot.reports.saturating_add(1);
                Ok(PollOutcome::Updated)
            }
            Err(G29ProtocolError::InvalidReportLength { expected, actual }) => {
                trace!(expected, actual, "Dropped input report with wrong length");
                Ok(PollOutcome::Rejected { len: actual })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn snapshot(&self) -> WheelSnapshot {
        *self.snapshot.read()
    }

    pub fn state(&self) -> ControllerState {
        self.snapshot.read().input.axes
    }

    pub fn buttons(&self) -> ButtonState {
        self.snapshot.read().input.buttons
    }

    pub fn is_button_pressed(&self, button: Button) -> bool {
        self.snapshot.read().input.buttons.is_pressed(button)
    }

    /// Unknown names read as not pressed.
    pub fn is_button_pressed_by_name(&self, name: &str) -> bool {
        self.snapshot.read().input.buttons.is_pressed_by_name(name)
    }

    /// First button of the precedence scan over the last applied report.
    /// `None` before any report arrives.
    pub fn pressed_button(&self) -> Option<Button> {
        self.snapshot.read().input.first_pressed
    }

    pub fn poll_state(&self) -> PollState {
        if self.polling.load(Ordering::Acquire) {
            PollState::Polling
        } else {
            PollState::Idle
        }
    }

    /// Send the reset pair and start the settle window.
    ///
    /// Returns the instant after which effect commands are accepted again.
    pub fn reset(&self) -> DeviceResult<Instant> {
        let mut transport = self.transport.lock();
        let deadline = self.write_command(&mut *transport, G29Command::Reset)?;
        let deadline = deadline.unwrap_or_else(Instant::now);
        debug!(settle = ?self.config.settle_delay(), "Reset sent, wheel settling");
        Ok(deadline)
    }

    /// Constant force at `value` in `[0.0, 1.0]`.
    pub fn constant_force(&self, value: f32) -> DeviceResult<()> {
        self.send(G29Command::ConstantForce(value))
    }

    /// Autocenter spring with `strength` and `rate` in `[0.0, 1.0]`.
    pub fn autocenter(&self, strength: f32, rate: f32) -> DeviceResult<()> {
        self.send(G29Command::Autocenter { strength, rate })
    }

    pub fn force_off(&self) -> DeviceResult<()> {
        self.send(G29Command::ForceOff)
    }

    /// Time left in the current settle window, if any.
    pub fn settle_remaining(&self) -> Option<Duration> {
        let until = (*self.settle_until.lock())?;
        let remaining = until.saturating_duration_since(Instant::now());
        (!remaining.is_zero()).then_some(remaining)
    }

    /// Block the calling thread until the settle window has passed.
    pub fn wait_for_settle(&self) {
        if let Some(remaining) = self.settle_remaining() {
            info!(?remaining, "Waiting for wheel to settle");
            std::thread::sleep(remaining);
        }
    }

    pub fn close(&self) -> DeviceResult<()> {
        self.transport.lock().close()?;
        info!(device = %self.info.usb_id(), "Closed G29");
        Ok(())
    }

    fn send(&self, command: G29Command) -> DeviceResult<()> {
        let mut transport = self.transport.lock();
        self.write_command(&mut *transport, command).map(|_| ())
    }

    /// Encode, gate and write one command while the caller holds the
    /// transport lock. The settle window is checked and started under that
    /// lock, so no effect can slip in behind a reset.
    ///
    /// Returns the new settle deadline when the command starts one.
    fn write_command(&self, transport: &mut T, command: G29Command) -> DeviceResult<Option<Instant>> {
        let frames = command.encode()?;

        if command.is_effect()
            && self.config.enforce_settle
            && let Some(remaining) = self.settle_remaining()
        {
            debug!(command = command.name(), ?remaining, "Command refused while settling");
            return Err(DeviceError::Settling { remaining });
        }

        for frame in frames.as_slice() {
            if let Err(e) = write_frame(transport, frame) {
                warn!(command = command.name(), error = %e, "Write failed");
                return Err(e.into());
            }
        }

        let deadline = command.requires_settle().then(|| {
            let now = Instant::now();
            let deadline = now.checked_add(self.config.settle_delay()).unwrap_or(now);
            *self.settle_until.lock() = Some(deadline);
            deadline
        });
        info!(
            command = command.name(),
            frames = frames.as_slice().len(),
            "Sent command"
        );
        Ok(deadline)
    }
}

fn write_frame<T: HidTransport + ?Sized>(
    transport: &mut T,
    frame: &CommandBuffer,
) -> Result<(), HidCommonError> {
    let written = transport.write_report(frame)?;
    if written < frame.len() {
        return Err(HidCommonError::ShortWrite {
            expected: frame.len(),
            actual: written,
        });
    }
    Ok(())
}
