//! Printer address resolution.
//!
//! Turns an optional, user supplied device identifier into an address the
//! transport can connect to. Identifiers that already look like an address
//! are used as-is; everything else costs one filtered scan.

use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::ble::transport::{Advertisement, ResolvedAddress, Transport};
use crate::config::PrinterConfig;
use crate::error::{Error, Result};

/// A caller supplied device identifier, classified by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdentifier {
    /// A UUID, as CoreBluetooth uses to key peripherals.
    Uuid(Uuid),
    /// Six colon separated alphanumeric groups, i.e. a MAC address.
    Address(String),
    /// Anything else is taken to be an advertised name.
    Name(String),
}

impl DeviceIdentifier {
    /// Classify an identifier string. Never fails: unrecognised shapes are names.
    pub fn parse(identifier: &str) -> Self {
        if let Ok(uuid) = Uuid::parse_str(identifier) {
            Self::Uuid(uuid)
        } else if looks_like_mac_address(identifier) {
            Self::Address(identifier.to_string())
        } else {
            Self::Name(identifier.to_string())
        }
    }

    /// The address this identifier names directly, without a scan.
    pub fn direct_address(&self) -> Option<ResolvedAddress> {
        match self {
            Self::Uuid(uuid) => Some(ResolvedAddress::new(uuid.to_string())),
            Self::Address(address) => Some(ResolvedAddress::new(address.clone())),
            Self::Name(_) => None,
        }
    }
}

impl From<&str> for DeviceIdentifier {
    fn from(identifier: &str) -> Self {
        Self::parse(identifier)
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(uuid) => write!(f, "{}", uuid),
            Self::Address(address) => f.write_str(address),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// Check for exactly five colons with only alphanumerics in between.
pub fn looks_like_mac_address(identifier: &str) -> bool {
    if identifier.matches(':').count() != 5 {
        return false;
    }

    let mut rest = identifier.chars().filter(|c| *c != ':').peekable();
    rest.peek().is_some() && rest.all(char::is_alphanumeric)
}

/// How a scan decides which advertisement is the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Accept any device advertising one of these services.
    AutoDiscover {
        /// Accepted service UUIDs.
        services: Vec<Uuid>,
    },
    /// Accept only a device advertising exactly this name (case-sensitive).
    ByName(String),
}

impl DiscoveryMode {
    /// Check an advertisement against this mode.
    pub fn matches(&self, advertisement: &dyn Advertisement) -> bool {
        match self {
            Self::AutoDiscover { services } => advertisement
                .service_uuids()
                .iter()
                .any(|uuid| services.contains(uuid)),
            Self::ByName(name) => advertisement.name() == Some(name.as_str()),
        }
    }
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutoDiscover { .. } => write!(f, "auto-discovery"),
            Self::ByName(name) => write!(f, "device named {}", name),
        }
    }
}

/// Resolves device identifiers to connectable addresses.
pub struct AddressResolver<'a, T: Transport> {
    transport: &'a T,
    config: &'a PrinterConfig,
}

impl<'a, T: Transport> AddressResolver<'a, T> {
    /// Create a resolver scanning through `transport`.
    pub fn new(transport: &'a T, config: &'a PrinterConfig) -> Self {
        Self { transport, config }
    }

    /// Resolve `identifier`, scanning for at most the configured scan timeout.
    pub async fn resolve(&self, identifier: Option<&str>) -> Result<ResolvedAddress> {
        self.resolve_with_timeout(identifier, self.config.scan_timeout)
            .await
    }

    /// Resolve `identifier`, scanning for at most `timeout`.
    ///
    /// # Errors
    ///
    /// An empty identifier is treated like `None` and auto-discovers.
    ///
    /// Returns [`Error::PrinterNotFound`] when the scan ends without a match.
    pub async fn resolve_with_timeout(
        &self,
        identifier: Option<&str>,
        timeout: Duration,
    ) -> Result<ResolvedAddress> {
        let identifier = identifier
            .filter(|s| !s.is_empty())
            .map(DeviceIdentifier::parse);

        if let Some(address) = identifier.as_ref().and_then(DeviceIdentifier::direct_address) {
            debug!("Using {} as address, no scan needed", address);
            return Ok(address);
        }

        let mode = match identifier {
            Some(DeviceIdentifier::Name(name)) => DiscoveryMode::ByName(name),
            _ => DiscoveryMode::AutoDiscover {
                services: self.config.service_uuids.clone(),
            },
        };

        match &mode {
            DiscoveryMode::AutoDiscover { .. } => info!("Trying to auto-discover a printer..."),
            DiscoveryMode::ByName(name) => info!("Looking for a BLE device named {}...", name),
        }

        let filter = |advertisement: &dyn Advertisement| mode.matches(advertisement);
        let device = self.transport.scan(&filter, timeout).await?;

        match device {
            Some(device) => {
                info!("Got it. Address: {}", device);
                Ok(device.address)
            }
            None => Err(Error::PrinterNotFound {
                query: mode.to_string(),
            }),
        }
    }
}
