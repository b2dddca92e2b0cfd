//! BLE communication module.
//!
//! This module provides the transport traits the printer logic is written
//! against, and their btleplug implementation.

pub mod advertising;
pub mod connection;
pub mod scanner;
pub mod transport;
pub mod uuids;

pub use advertising::AdvertisementInfo;
pub use connection::{ConnectionState, PrinterConnection};
pub use scanner::BleScanner;
pub use transport::{
    Advertisement, Connection, DiscoveredDevice, ResolvedAddress, ScanPredicate, Transport,
};
pub use uuids::*;
