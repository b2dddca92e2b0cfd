//! BLE scanning functionality.
//!
//! btleplug-backed [`Transport`]: finds the first peripheral matching a
//! filter and opens printer connections.

use async_trait::async_trait;
use btleplug::api::{
    BDAddr, Central, CentralEvent, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::StreamExt;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::ble::advertising::AdvertisementInfo;
use crate::ble::connection::PrinterConnection;
use crate::ble::transport::{
    Advertisement, DiscoveredDevice, ResolvedAddress, ScanPredicate, Transport,
};
use crate::config::PrinterConfig;
use crate::error::{Error, Result};

/// BLE scanner and connector for cat printers.
pub struct BleScanner {
    /// The BLE adapter to use for scanning.
    adapter: Adapter,
    /// Printer layout and timings.
    config: PrinterConfig,
}

impl BleScanner {
    /// Create a new BLE scanner on the first available adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if Bluetooth is not available.
    pub async fn new(config: PrinterConfig) -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|_e| Error::BluetoothUnavailable)?;

        let adapters = manager.adapters().await.map_err(Error::Bluetooth)?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::BluetoothUnavailable)?;

        info!(
            "Using Bluetooth adapter: {:?}",
            adapter.adapter_info().await.ok()
        );

        Ok(Self { adapter, config })
    }

    /// Create a new BLE scanner with a specific adapter.
    pub fn with_adapter(adapter: Adapter, config: PrinterConfig) -> Self {
        Self { adapter, config }
    }

    /// Get the underlying adapter.
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    /// Get the configuration.
    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Look up the peripheral behind `address`.
    ///
    /// Peripherals the adapter already knows are matched directly; otherwise a
    /// single scan bounded by the configured scan timeout looks for it.
    pub async fn find_peripheral(&self, address: &ResolvedAddress) -> Result<Peripheral> {
        let wanted = address.as_str();

        for peripheral in self.adapter.peripherals().await.map_err(Error::Bluetooth)? {
            if address_matches(wanted, &peripheral.id().to_string(), peripheral.address()) {
                debug!("Peripheral {} already known to the adapter", wanted);
                return Ok(peripheral);
            }
        }

        debug!("Peripheral {} not cached, scanning for it", wanted);

        let found = self
            .scan_until(self.config.scan_timeout, |id, properties| {
                address_matches(wanted, id, properties.address)
            })
            .await?;

        found
            .map(|(peripheral, _)| peripheral)
            .ok_or_else(|| Error::ConnectionFailed {
                address: wanted.to_string(),
                reason: "peripheral not seen by the adapter".to_string(),
            })
    }

    /// Scan until `accept` returns true for a peripheral, or `timeout` elapses.
    async fn scan_until<F>(
        &self,
        timeout: Duration,
        accept: F,
    ) -> Result<Option<(Peripheral, AdvertisementInfo)>>
    where
        F: Fn(&str, &PeripheralProperties) -> bool + Send + Sync,
    {
        let mut events = self.adapter.events().await.map_err(Error::Bluetooth)?;

        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(Error::Bluetooth)?;

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let found = loop {
            tokio::select! {
                _ = &mut deadline => {
                    debug!("Scan timed out after {:?}", timeout);
                    break None;
                }
                event = events.next() => {
                    let id = match event {
                        Some(CentralEvent::DeviceDiscovered(id))
                        | Some(CentralEvent::DeviceUpdated(id))
                        | Some(CentralEvent::ServicesAdvertisement { id, .. }) => id,
                        Some(_) => continue,
                        None => {
                            warn!("Adapter event stream ended during scan");
                            break None;
                        }
                    };

                    if let Some(hit) = self.inspect(&id, &accept).await {
                        break Some(hit);
                    }
                }
            }
        };

        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        Ok(found)
    }

    /// Fetch the properties of a peripheral and run them through `accept`.
    async fn inspect<F>(
        &self,
        id: &PeripheralId,
        accept: &F,
    ) -> Option<(Peripheral, AdvertisementInfo)>
    where
        F: Fn(&str, &PeripheralProperties) -> bool + Send + Sync,
    {
        let peripheral = match self.adapter.peripheral(id).await {
            Ok(p) => p,
            Err(e) => {
                trace!("Failed to get peripheral: {}", e);
                return None;
            }
        };

        let properties = peripheral.properties().await.ok().flatten()?;
        let id = id.to_string();

        trace!(
            "Advertisement from {}: name={:?} services={:?}",
            id,
            properties.local_name,
            properties.services
        );

        if !accept(&id, &properties) {
            return None;
        }

        let info = AdvertisementInfo::from_properties(&id, &properties);
        Some((peripheral, info))
    }
}

#[async_trait]
impl Transport for BleScanner {
    type Connection = PrinterConnection;

    async fn scan(
        &self,
        filter: &ScanPredicate<'_>,
        timeout: Duration,
    ) -> Result<Option<DiscoveredDevice>> {
        let found = self
            .scan_until(timeout, |id, properties| {
                let info = AdvertisementInfo::from_properties(id, properties);
                filter(&info as &dyn Advertisement)
            })
            .await?;

        Ok(found.map(|(_, info)| info.into_device()))
    }

    async fn connect(&self, address: &ResolvedAddress) -> Result<PrinterConnection> {
        let peripheral = self.find_peripheral(address).await?;
        PrinterConnection::open(peripheral, &self.config).await
    }
}

/// Check whether a peripheral is the one a caller asked for, by platform id or MAC.
fn address_matches(wanted: &str, peripheral_id: &str, address: BDAddr) -> bool {
    wanted.eq_ignore_ascii_case(peripheral_id)
        || (address != BDAddr::from([0u8; 6])
            && wanted.eq_ignore_ascii_case(&address.to_string()))
}
