//! Transport capability surface.
//!
//! The resolver and the transfer session only ever talk to a BLE stack
//! through these traits. The btleplug backend lives in [`scanner`] and
//! [`connection`]; tests drive the same code through in-memory fakes.
//!
//! [`scanner`]: crate::ble::scanner
//! [`connection`]: crate::ble::connection

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;

/// A connectable, transport-specific device address.
///
/// Only meaningful for the current discovery session: some platforms rotate
/// addresses between runs, so these are never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedAddress(String);

impl ResolvedAddress {
    /// Wrap a transport address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResolvedAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl From<&str> for ResolvedAddress {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

/// What a scan filter gets to look at in an advertisement.
pub trait Advertisement {
    /// Advertised local name, if any.
    fn name(&self) -> Option<&str>;
    /// Advertised service UUIDs.
    fn service_uuids(&self) -> &[Uuid];
}

/// Predicate deciding whether an advertisement is the device we want.
pub type ScanPredicate<'a> = dyn Fn(&dyn Advertisement) -> bool + Send + Sync + 'a;

/// A device returned by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Address to connect to.
    pub address: ResolvedAddress,
    /// Advertised name at the time of discovery.
    pub name: Option<String>,
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.address, name),
            None => write!(f, "{}", self.address),
        }
    }
}

/// A BLE stack able to find and connect to peripherals.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connection handle produced by [`Transport::connect`].
    type Connection: Connection;

    /// Scan until the first advertisement accepted by `filter`, or until `timeout`.
    ///
    /// Returns `Ok(None)` when nothing matched in time.
    async fn scan(
        &self,
        filter: &ScanPredicate<'_>,
        timeout: Duration,
    ) -> Result<Option<DiscoveredDevice>>;

    /// Open a connection to `address`.
    async fn connect(&self, address: &ResolvedAddress) -> Result<Self::Connection>;
}

/// An open link to a peripheral.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Negotiated ATT MTU for this link.
    fn mtu(&self) -> u16;

    /// Whether the link is still up.
    async fn is_connected(&self) -> bool;

    /// Write `data` to the characteristic `characteristic` as a single operation.
    async fn write(&self, characteristic: &Uuid, data: &[u8]) -> Result<()>;

    /// Tear the link down. Calling this on a closed link is a no-op.
    async fn close(&mut self) -> Result<()>;
}
