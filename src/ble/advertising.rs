//! Advertisement snapshots.
//!
//! Converts what the BLE stack knows about a peripheral into the small
//! view the discovery filters work on.

use btleplug::api::{BDAddr, PeripheralProperties};
use uuid::Uuid;

use crate::ble::transport::{Advertisement, DiscoveredDevice, ResolvedAddress};

/// Advertisement data seen for one peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementInfo {
    /// Address the peripheral can be connected through.
    pub address: ResolvedAddress,
    /// Advertised local name.
    pub name: Option<String>,
    /// Advertised service UUIDs.
    pub services: Vec<Uuid>,
    /// Signal strength in dBm.
    pub rssi: Option<i16>,
}

impl AdvertisementInfo {
    /// Create a snapshot from its parts.
    pub fn new(
        address: impl Into<ResolvedAddress>,
        name: Option<String>,
        services: Vec<Uuid>,
    ) -> Self {
        Self {
            address: address.into(),
            name,
            services,
            rssi: None,
        }
    }

    /// Build a snapshot from peripheral properties.
    ///
    /// `peripheral_id` is used as the address whenever the stack hides the
    /// MAC (CoreBluetooth reports an all-zero address and keys peripherals by UUID).
    pub fn from_properties(peripheral_id: &str, properties: &PeripheralProperties) -> Self {
        Self {
            address: connectable_address(properties.address, peripheral_id),
            name: properties.local_name.clone(),
            services: properties.services.clone(),
            rssi: properties.rssi,
        }
    }

    /// Turn the snapshot into a scan result.
    pub fn into_device(self) -> DiscoveredDevice {
        DiscoveredDevice {
            address: self.address,
            name: self.name,
        }
    }
}

impl Advertisement for AdvertisementInfo {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn service_uuids(&self) -> &[Uuid] {
        &self.services
    }
}

/// Pick the address to hand back to callers for a peripheral.
pub fn connectable_address(address: BDAddr, peripheral_id: &str) -> ResolvedAddress {
    if address == BDAddr::from([0u8; 6]) {
        ResolvedAddress::new(peripheral_id)
    } else {
        ResolvedAddress::new(address.to_string())
    }
}
