//! HID transport trait

use std::time::Duration;

use crate::{HidCommonResult, HidDeviceInfo};

/// Blocking-with-timeout access to one opened HID device.
///
/// Implementations own the device handle. Open failures, failed transfers
/// and disconnects are reported as [`crate::HidCommonError`] values for
/// which [`crate::HidCommonError::is_unavailable`] is true. After a failed
/// transfer the transport stays disconnected.
pub trait HidTransport: Send {
    /// Send one output report. Returns the number of bytes written.
    fn write_report(&mut self, data: &[u8]) -> HidCommonResult<usize>;

    /// Wait up to `timeout` for one input report and copy it into `buf`.
    ///
    /// Returns the number of bytes read, or `0` when nothing arrived in time.
    fn read_report_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> HidCommonResult<usize>;

    fn device_info(&self) -> &HidDeviceInfo;

    fn is_connected(&self) -> bool;

    fn close(&mut self) -> HidCommonResult<()>;
}

impl<T: HidTransport + ?Sized> HidTransport for Box<T> {
    fn write_report(&mut self, data: &[u8]) -> HidCommonResult<usize> {
        (**self).write_report(data)
    }

    fn read_report_timeout(&mut self, buf: &mut [u8], timeout: Duration) -> HidCommonResult<usize> {
        (**self).read_report_timeout(buf, timeout)
    }

    fn device_info(&self) -> &HidDeviceInfo {
        (**self).device_info()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn close(&mut self) -> HidCommonResult<()> {
        (**self).close()
    }
}

pub mod mock {
    use super::*;
    use crate::HidCommonError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// One scripted response to `read_report_timeout`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MockRead {
        Report(Vec<u8>),
        Timeout,
        Failure(String),
    }

    /// In-memory transport. Clones share queues and history, so a test can
    /// keep one handle while the device wrapper owns another.
    #[derive(Clone)]
    pub struct MockHidTransport {
        info: HidDeviceInfo,
        read_queue: Arc<Mutex<VecDeque<MockRead>>>,
        write_history: Arc<Mutex<Vec<Vec<u8>>>>,
        read_timeouts: Arc<Mutex<Vec<Duration>>>,
        write_limit: Arc<Mutex<Option<usize>>>,
        connected: Arc<Mutex<bool>>,
    }

    impl MockHidTransport {
        pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
            Self {
                info: HidDeviceInfo::new(vendor_id, product_id, path),
                read_queue: Arc::new(Mutex::new(VecDeque::new())),
                write_history: Arc::new(Mutex::new(Vec::new())),
                read_timeouts: Arc::new(Mutex::new(Vec::new())),
                write_limit: Arc::new(Mutex::new(None)),
                connected: Arc::new(Mutex::new(true)),
            }
        }

        pub fn queue_read(&self, data: Vec<u8>) {
            let mut queue = self.read_queue.lock().unwrap_or_else(|e| e.into_inner());
            queue.push_back(MockRead::Report(data));
        }

        pub fn queue_timeout(&self) {
            let mut queue = self.read_queue.lock().unwrap_or_else(|e| e.into_inner());
            queue.push_back(MockRead::Timeout);
        }

        /// Fail the next read the way hidapi does when the device is pulled:
        /// a `ReadError`, after which the transport stays disconnected.
        pub fn queue_read_error(&self, message: impl Into<String>) {
            let mut queue = self.read_queue.lock().unwrap_or_else(|e| e.into_inner());
            queue.push_back(MockRead::Failure(message.into()));
        }

        pub fn pending_reads(&self) -> usize {
            self.read_queue
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .len()
        }

        pub fn get_write_history(&self) -> Vec<Vec<u8>> {
            let history = self.write_history.lock().unwrap_or_else(|e| e.into_inner());
            history.clone()
        }

        /// Timeouts passed to each read, in call order.
        pub fn read_timeouts(&self) -> Vec<Duration> {
            let timeouts = self.read_timeouts.lock().unwrap_or_else(|e| e.into_inner());
            timeouts.clone()
        }

        /// Cap the byte count reported by subsequent writes.
        pub fn set_write_limit(&self, limit: Option<usize>) {
            let mut current = self.write_limit.lock().unwrap_or_else(|e| e.into_inner());
            *current = limit;
        }

        pub fn disconnect(&self) {
            let mut connected = self.connected.lock().unwrap_or_else(|e| e.into_inner());
            *connected = false;
        }

        pub fn reconnect(&self) {
            let mut connected = self.connected.lock().unwrap_or_else(|e| e.into_inner());
            *connected = true;
        }
    }

    impl HidTransport for MockHidTransport {
        fn write_report(&mut self, data: &[u8]) -> HidCommonResult<usize> {
            if !self.is_connected() {
                return Err(HidCommonError::Disconnected);
            }

            let mut history = self.write_history.lock().unwrap_or_else(|e| e.into_inner());
            history.push(data.to_vec());
            let limit = *self.write_limit.lock().unwrap_or_else(|e| e.into_inner());
            Ok(limit.map_or(data.len(), |l| l.min(data.len())))
        }

        fn read_report_timeout(
            &mut self,
            buf: &mut [u8],
            timeout: Duration,
        ) -> HidCommonResult<usize> {
            if !self.is_connected() {
                return Err(HidCommonError::Disconnected);
            }

            self.read_timeouts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(timeout);

            let next = self
                .read_queue
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            match next {
                Some(MockRead::Report(data)) => {
                    let n = data.len().min(buf.len());
                    if let (Some(dst), Some(src)) = (buf.get_mut(..n), data.get(..n)) {
                        dst.copy_from_slice(src);
                    }
                    Ok(n)
                }
                Some(MockRead::Failure(message)) => {
                    self.disconnect();
                    Err(HidCommonError::ReadError(message))
                }
                Some(MockRead::Timeout) | None => Ok(0),
            }
        }

        fn device_info(&self) -> &HidDeviceInfo {
            &self.info
        }

        fn is_connected(&self) -> bool {
            *self.connected.lock().unwrap_or_else(|e| e.into_inner())
        }

        fn close(&mut self) -> HidCommonResult<()> {
            self.disconnect();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HidCommonError;

    #[test]
    fn test_mock_transport_basic() {
        let transport = mock::MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0");

        assert_eq!(transport.device_info().vendor_id, 0x046D);
        assert_eq!(transport.device_info().product_id, 0xC24F);
        assert!(transport.is_connected());
    }

    #[test]
    fn test_mock_transport_write() -> Result<(), Box<dyn std::error::Error>> {
        let mut transport = mock::MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0");

        let written = transport.write_report(&[0x10, 0x00, 0x00])?;
        assert_eq!(written, 3);

        let history = transport.get_write_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0], vec![0x10, 0x00, 0x00]);
        Ok(())
    }

    #[test]
    fn test_mock_transport_write_limit() -> Result<(), Box<dyn std::error::Error>> {
        let mut transport = mock::MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0");
        transport.set_write_limit(Some(2));
        assert_eq!(transport.write_report(&[1, 2, 3, 4, 5, 6, 7])?, 2);
        transport.set_write_limit(None);
        assert_eq!(transport.write_report(&[1, 2, 3])?, 3);
        Ok(())
    }

    #[test]
    fn test_mock_transport_read_and_timeout() -> Result<(), Box<dyn std::error::Error>> {
        let handle = mock::MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0");
        handle.queue_read(vec![0xAA, 0xBB, 0xCC]);
        handle.queue_timeout();

        let mut transport = handle.clone();
        let mut buf = [0u8; 16];
        let n = transport.read_report_timeout(&mut buf, Duration::from_millis(5))?;
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], &[0xAA, 0xBB, 0xCC]);

        let n = transport.read_report_timeout(&mut buf, Duration::from_millis(7))?;
        assert_eq!(n, 0, "scripted timeout reads zero bytes");
        let n = transport.read_report_timeout(&mut buf, Duration::from_millis(9))?;
        assert_eq!(n, 0, "empty queue reads as timeout");

        assert_eq!(
            handle.read_timeouts(),
            vec![
                Duration::from_millis(5),
                Duration::from_millis(7),
                Duration::from_millis(9)
            ]
        );
        Ok(())
    }

    #[test]
    fn test_mock_transport_truncates_to_buffer() -> Result<(), Box<dyn std::error::Error>> {
        let mut transport = mock::MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0");
        transport.queue_read(vec![7u8; 32]);
        let mut buf = [0u8; 16];
        assert_eq!(transport.read_report_timeout(&mut buf, Duration::ZERO)?, 16);
        Ok(())
    }

    #[test]
    fn test_mock_transport_disconnect() {
        let transport = mock::MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0");

        transport.disconnect();

        let mut transport = transport;
        assert!(!transport.is_connected());

        let result = transport.write_report(&[0x01]);
        assert!(matches!(result, Err(HidCommonError::Disconnected)));

        let mut buf = [0u8; 16];
        let result = transport.read_report_timeout(&mut buf, Duration::ZERO);
        assert!(matches!(result, Err(HidCommonError::Disconnected)));
    }

    #[test]
    fn test_boxed_transport_delegates() -> Result<(), Box<dyn std::error::Error>> {
        let handle = mock::MockHidTransport::new(0x046D, 0xC24F, "/dev/hidraw0");
        let mut boxed: Box<dyn HidTransport> = Box::new(handle.clone());
        boxed.write_report(&[0xF8])?;
        assert_eq!(handle.get_write_history(), vec![vec![0xF8]]);
        boxed.close()?;
        assert!(!handle.is_connected());
        Ok(())
    }
}
