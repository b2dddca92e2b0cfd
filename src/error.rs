//! Error types for the catprinter-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Bluetooth is not available or is disabled on this system.
    #[error("Bluetooth not available or disabled")]
    BluetoothUnavailable,

    /// No advertising device matched the discovery filter before the scan timed out.
    #[error("Unable to find printer ({query}), make sure it is turned on and in range")]
    PrinterNotFound {
        /// What the scan was looking for.
        query: String,
    },

    /// Failed to establish a connection to the printer.
    #[error("Connection to {address} failed: {reason}")]
    ConnectionFailed {
        /// The address we tried to connect to.
        address: String,
        /// Description of why the connection failed.
        reason: String,
    },

    /// The connection to the printer was lost mid-session.
    #[error("Connection lost")]
    ConnectionLost,

    /// Writing a single chunk to the printer failed.
    #[error("Write of chunk {chunk}/{total} failed: {reason}")]
    WriteFailed {
        /// 1-based index of the failing chunk.
        chunk: usize,
        /// Total number of chunks in the transfer.
        total: usize,
        /// Description of the underlying failure.
        reason: String,
    },

    /// The negotiated MTU leaves no room for payload bytes.
    #[error("Negotiated MTU {mtu} is too small to carry any payload")]
    InvalidMtu {
        /// The MTU reported by the link.
        mtu: u16,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },
}

impl Error {
    /// Check if this error came out of device discovery.
    pub fn is_discovery(&self) -> bool {
        matches!(self, Self::PrinterNotFound { .. })
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
