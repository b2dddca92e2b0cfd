// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # catprinter-ble
//!
//! Find a nearby BLE thermal "cat" printer and stream a ready-made print
//! payload to it.
//!
//! The payload is opaque to this crate: render and encode it however the
//! printer expects, then hand over the bytes. The crate takes care of
//! discovery, sizing writes to the link's MTU, pacing them so the printer's
//! buffer keeps up, and holding the connection open until the job is out.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catprinter_ble::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let payload = std::fs::read("job.bin").expect("payload");
//!
//!     // No identifier: pick the first printer advertising a known service.
//!     catprinter_ble::run(payload, None).await
//! }
//! ```
//!
//! A device can also be named by MAC address, by platform UUID (macOS), or
//! by its advertised name:
//!
//! ```rust,no_run
//! # async fn demo(payload: Vec<u8>) -> catprinter_ble::Result<()> {
//! catprinter_ble::run(payload, Some("MX06")).await
//! # }
//! ```
//!
//! ## Platform Notes
//!
//! ### macOS
//! Requires Bluetooth permission. Peripherals are addressed by UUID, and
//! the printer advertises its service as `af30` instead of `ae30`.
//!
//! ### Linux
//! Requires BlueZ. User may need to be in the `bluetooth` group.
//!
//! ### Windows
//! Requires Windows 10 or later with Bluetooth LE support.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for [`PrinterConfig`]

// Public modules
pub mod ble;
pub mod config;
pub mod error;
pub mod resolver;
pub mod session;

use bytes::Bytes;
use tracing::error;

// Re-exports for convenience
pub use ble::{BleScanner, ConnectionState, ResolvedAddress, Transport};
pub use config::PrinterConfig;
pub use error::{Error, Result};
pub use resolver::{AddressResolver, DeviceIdentifier, DiscoveryMode};
pub use session::{TransferSession, TransferState};

/// Send `data` to a printer using the default configuration.
///
/// `device` may be a MAC address, a platform UUID, an advertised name, or
/// `None` to auto-discover.
pub async fn run(data: impl Into<Bytes>, device: Option<&str>) -> Result<()> {
    run_with_config(data, device, PrinterConfig::default()).await
}

/// Send `data` to a printer over the first Bluetooth adapter, using `config`.
pub async fn run_with_config(
    data: impl Into<Bytes>,
    device: Option<&str>,
    config: PrinterConfig,
) -> Result<()> {
    let scanner = match BleScanner::new(config.clone()).await {
        Ok(scanner) => scanner,
        Err(e) => {
            error!("Print failed: {}", e);
            return Err(e);
        }
    };

    run_with(&scanner, &config, data, device).await
}

/// Send `data` to a printer through any [`Transport`].
pub async fn run_with<T: Transport>(
    transport: &T,
    config: &PrinterConfig,
    data: impl Into<Bytes>,
    device: Option<&str>,
) -> Result<()> {
    TransferSession::new(transport, config)
        .send(data, device)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that key types are exported
        let _ = std::any::TypeId::of::<BleScanner>();
        let _ = std::any::TypeId::of::<PrinterConfig>();
        let _ = std::any::TypeId::of::<Error>();
        let _ = std::any::TypeId::of::<TransferState>();
        let _ = std::any::TypeId::of::<DeviceIdentifier>();
        let _ = std::any::TypeId::of::<ResolvedAddress>();
    }
}
