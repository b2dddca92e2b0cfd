//! Printer configuration.
//!
//! GATT layout and timings of the printer, passed explicitly to the
//! resolver and the transfer session.

use std::time::Duration;
use uuid::Uuid;

use crate::ble::uuids::{PRINTER_SERVICE_UUIDS, PRINT_CHARACTERISTIC_UUID};

/// Default discovery scan timeout.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause between consecutive chunk writes.
pub const DEFAULT_CHUNK_DELAY: Duration = Duration::from_millis(20);

/// Default time the link is held open after the last chunk.
///
/// The printer gives no signal when it has finished feeding paper, so the
/// connection stays up long enough for a typical job to come out.
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_secs(30);

/// Smallest ATT MTU a BLE link can negotiate.
pub const MIN_ATT_MTU: u16 = 23;

/// Configuration for discovering and talking to a printer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrinterConfig {
    /// Service UUIDs accepted during auto-discovery. At least one must be advertised.
    pub service_uuids: Vec<Uuid>,
    /// Characteristic the payload is written to.
    pub write_characteristic: Uuid,
    /// Upper bound on a single discovery scan.
    pub scan_timeout: Duration,
    /// Pause between consecutive chunk writes.
    pub chunk_delay: Duration,
    /// Pause between the last write and disconnecting.
    pub drain_delay: Duration,
    /// MTU reported by backends that cannot read the negotiated value from the stack.
    pub assumed_mtu: u16,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            service_uuids: PRINTER_SERVICE_UUIDS.to_vec(),
            write_characteristic: PRINT_CHARACTERISTIC_UUID,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            chunk_delay: DEFAULT_CHUNK_DELAY,
            drain_delay: DEFAULT_DRAIN_DELAY,
            assumed_mtu: MIN_ATT_MTU,
        }
    }
}

impl PrinterConfig {
    /// Create a configuration with the stock printer layout and timings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service UUIDs used for auto-discovery.
    pub fn with_service_uuids(mut self, uuids: impl IntoIterator<Item = Uuid>) -> Self {
        self.service_uuids = uuids.into_iter().collect();
        self
    }

    /// Set the write characteristic.
    pub fn with_write_characteristic(mut self, uuid: Uuid) -> Self {
        self.write_characteristic = uuid;
        self
    }

    /// Set the discovery scan timeout.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the pause between chunks.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Set the pause before disconnecting.
    pub fn with_drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }

    /// Set the MTU assumed when the stack does not report one.
    pub fn with_assumed_mtu(mut self, mtu: u16) -> Self {
        self.assumed_mtu = mtu;
        self
    }
}
