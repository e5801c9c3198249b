//! `hidapi`-backed transport for real hardware.

use std::time::Duration;

use hidapi::{DeviceInfo, HidApi, HidDevice};
use tracing::{debug, info, warn};

use crate::{HidCommonError, HidCommonResult, HidDeviceInfo, HidTransport};

pub struct HidApiTransport {
    device: HidDevice,
    info: HidDeviceInfo,
    connected: bool,
}

impl HidApiTransport {
    /// Open the first enumerated device matching `vendor_id:product_id`.
    pub fn open(vendor_id: u16, product_id: u16) -> HidCommonResult<Self> {
        let api = HidApi::new().map_err(|e| HidCommonError::OpenError(e.to_string()))?;

        let entry = api
            .device_list()
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .ok_or_else(|| {
                HidCommonError::DeviceNotFound(format!("{vendor_id:04x}:{product_id:04x}"))
            })?;
        let info = describe(entry);

        let device = entry
            .open_device(&api)
            .map_err(|e| HidCommonError::OpenError(format!("{}: {e}", info.usb_id())))?;

        info!(device = %info.display_name(), path = %info.path, "Opened HID device");
        Ok(Self {
            device,
            info,
            connected: true,
        })
    }
}

/// Enumerate every HID interface exposed under `vendor_id`.
pub fn list_devices(vendor_id: u16) -> HidCommonResult<Vec<HidDeviceInfo>> {
    let api = HidApi::new().map_err(|e| HidCommonError::OpenError(e.to_string()))?;
    let devices: Vec<HidDeviceInfo> = api
        .device_list()
        .filter(|d| d.vendor_id() == vendor_id)
        .map(describe)
        .collect();
    debug!(
        vendor_id = %format!("0x{vendor_id:04X}"),
        count = devices.len(),
        "Enumerated HID devices"
    );
    Ok(devices)
}

fn describe(entry: &DeviceInfo) -> HidDeviceInfo {
    let mut info = HidDeviceInfo::new(
        entry.vendor_id(),
        entry.product_id(),
        entry.path().to_string_lossy().to_string(),
    )
    .with_interface(entry.interface_number());
    if let Some(serial) = entry.serial_number() {
        info = info.with_serial(serial);
    }
    if let Some(manufacturer) = entry.manufacturer_string() {
        info = info.with_manufacturer(manufacturer);
    }
    if let Some(product) = entry.product_string() {
        info = info.with_product_name(product);
    }
    info
}

/// Record a failed transfer. hidapi gives no separate unplug signal, so the
/// handle is treated as gone and later calls fail fast with `Disconnected`.
fn transfer_failed(
    connected: &mut bool,
    info: &HidDeviceInfo,
    error: HidCommonError,
) -> HidCommonError {
    *connected = false;
    warn!(
        device = %info.usb_id(),
        error = %error,
        "HID transfer failed, device marked disconnected"
    );
    error
}

/// hidapi takes milliseconds as `i32`; saturate anything longer.
fn timeout_ms(timeout: Duration) -> i32 {
    i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX)
}

impl HidTransport for HidApiTransport {
    fn write_report(&mut self, data: &[u8]) -> HidCommonResult<usize> {
        if !self.connected {
            return Err(HidCommonError::Disconnected);
        }
        self.device.write(data).map_err(|e| {
            transfer_failed(
                &mut self.connected,
                &self.info,
                HidCommonError::WriteError(e.to_string()),
            )
        })
    }

    fn read_report_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> HidCommonResult<usize> {
        if !self.connected {
            return Err(HidCommonError::Disconnected);
        }
        self.device
            .read_timeout(buf, timeout_ms(timeout))
            .map_err(|e| {
                transfer_failed(
                    &mut self.connected,
                    &self.info,
                    HidCommonError::ReadError(e.to_string()),
                )
            })
    }

    fn device_info(&self) -> &HidDeviceInfo {
        &self.info
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn close(&mut self) -> HidCommonResult<()> {
        // The handle itself is released on drop.
        self.connected = false;
        debug!(device = %self.info.usb_id(), "Closed HID device");
        Ok(())
    }
}
