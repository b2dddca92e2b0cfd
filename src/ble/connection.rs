//! BLE connection management.
//!
//! Opens a link to a printer, locates its write characteristic and
//! carries payload writes over it.

use async_trait::async_trait;
use btleplug::api::{CharPropFlags, Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::transport::Connection;
use crate::config::PrinterConfig;
use crate::error::{Error, Result};

/// Connection state for a printer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected to the printer.
    #[default]
    Disconnected,
    /// Connected to the printer.
    Connected,
    /// Currently disconnecting.
    Disconnecting,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Choose the write type a characteristic supports, preferring unacknowledged writes.
pub fn write_type_for(properties: CharPropFlags) -> WriteType {
    if properties.contains(CharPropFlags::WRITE_WITHOUT_RESPONSE) {
        WriteType::WithoutResponse
    } else {
        WriteType::WithResponse
    }
}

/// An open link to a printer.
pub struct PrinterConnection {
    /// The connected peripheral.
    peripheral: Peripheral,
    /// The characteristic payload bytes go to.
    characteristic: Characteristic,
    /// Write type used for the payload characteristic.
    write_type: WriteType,
    /// ATT MTU used to size writes.
    mtu: u16,
    /// Current connection state.
    state: RwLock<ConnectionState>,
}

impl PrinterConnection {
    /// Connect to `peripheral` and locate the configured write characteristic.
    ///
    /// btleplug does not report the negotiated MTU, so the link carries
    /// [`PrinterConfig::assumed_mtu`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionFailed`] if the link or service discovery
    /// fails and [`Error::CharacteristicNotFound`] if the peripheral has no
    /// write characteristic. The link is torn down again in both cases.
    pub async fn open(peripheral: Peripheral, config: &PrinterConfig) -> Result<Self> {
        let address = peripheral.id().to_string();

        if peripheral.is_connected().await.unwrap_or(false) {
            info!("Peripheral already connected at BLE level");
        } else {
            peripheral
                .connect()
                .await
                .map_err(|e| Error::ConnectionFailed {
                    address: address.clone(),
                    reason: e.to_string(),
                })?;
        }

        if let Err(e) = peripheral.discover_services().await {
            Self::abandon(&peripheral).await;
            return Err(Error::ConnectionFailed {
                address,
                reason: format!("service discovery failed: {}", e),
            });
        }

        let characteristic = match peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == config.write_characteristic)
        {
            Some(c) => c,
            None => {
                Self::abandon(&peripheral).await;
                return Err(Error::CharacteristicNotFound {
                    uuid: config.write_characteristic.to_string(),
                });
            }
        };

        let write_type = write_type_for(characteristic.properties);

        debug!(
            "Found write characteristic {}, properties: {:?}, using {:?}",
            characteristic.uuid, characteristic.properties, write_type
        );

        Ok(Self {
            peripheral,
            characteristic,
            write_type,
            mtu: config.assumed_mtu,
            state: RwLock::new(ConnectionState::Connected),
        })
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Get the peripheral.
    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    /// Best-effort disconnect after a failed open.
    async fn abandon(peripheral: &Peripheral) {
        if let Err(e) = peripheral.disconnect().await {
            warn!("Failed to disconnect after aborted connect: {}", e);
        }
    }

    /// Resolve the characteristic for `uuid`, reusing the cached write characteristic.
    fn characteristic_for(&self, uuid: &Uuid) -> Result<(Characteristic, WriteType)> {
        if *uuid == self.characteristic.uuid {
            return Ok((self.characteristic.clone(), self.write_type));
        }

        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == *uuid)
            .map(|c| {
                let write_type = write_type_for(c.properties);
                (c, write_type)
            })
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    /// Update the connection state.
    fn set_state(&self, new_state: ConnectionState) {
        let old_state = std::mem::replace(&mut *self.state.write(), new_state);

        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);
        }
    }
}

#[async_trait]
impl Connection for PrinterConnection {
    fn mtu(&self) -> u16 {
        self.mtu
    }

    async fn is_connected(&self) -> bool {
        self.state().is_connected() && self.peripheral.is_connected().await.unwrap_or(false)
    }

    async fn write(&self, characteristic: &Uuid, data: &[u8]) -> Result<()> {
        let (characteristic, write_type) = self.characteristic_for(characteristic)?;

        self.peripheral
            .write(&characteristic, data, write_type)
            .await
            .map_err(Error::Bluetooth)?;

        trace!(
            "Wrote {} bytes to characteristic {}",
            data.len(),
            characteristic.uuid
        );

        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let current_state = self.state();

        if matches!(
            current_state,
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Ok(());
        }

        self.set_state(ConnectionState::Disconnecting);

        let result = self.peripheral.disconnect().await;
        self.set_state(ConnectionState::Disconnected);

        match result {
            Ok(_) => {
                info!("Disconnected from printer");
                Ok(())
            }
            Err(e) => {
                warn!("Failed to disconnect: {}", e);
                Err(Error::Bluetooth(e))
            }
        }
    }
}
