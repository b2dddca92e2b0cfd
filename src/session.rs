//! Print data transfer.
//!
//! A [`TransferSession`] owns one connection lifecycle: resolve the printer,
//! connect, stream the payload in MTU-sized chunks with a pause between
//! writes, hold the link open while the printer catches up, then disconnect.

use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use crate::ble::transport::{Connection, Transport};
use crate::config::PrinterConfig;
use crate::error::{Error, Result};
use crate::resolver::AddressResolver;

/// Bytes of every ATT write taken by the opcode and attribute handle.
pub const ATT_WRITE_OVERHEAD: usize = 3;

/// Lifecycle of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransferState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Looking up the printer address.
    Resolving,
    /// Opening the link.
    Connecting,
    /// Link is up, nothing sent yet.
    Connected,
    /// Writing chunks.
    Sending,
    /// Everything written, waiting before disconnect.
    Draining,
    /// Transfer finished and link closed.
    Disconnected,
    /// Transfer aborted.
    Failed,
}

impl TransferState {
    /// Check if the session has reached an end state.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Resolving => write!(f, "Resolving"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Sending => write!(f, "Sending"),
            Self::Draining => write!(f, "Draining"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Largest payload slice a single write can carry on a link with this MTU.
///
/// # Errors
///
/// Returns [`Error::InvalidMtu`] if the MTU does not exceed the write overhead.
pub fn chunk_size_for_mtu(mtu: u16) -> Result<usize> {
    match usize::from(mtu).checked_sub(ATT_WRITE_OVERHEAD) {
        Some(size) if size > 0 => Ok(size),
        _ => Err(Error::InvalidMtu { mtu }),
    }
}

/// Split `payload` into consecutive slices of at most `chunk_size` bytes.
///
/// The slices share the payload's buffer. An empty payload yields nothing.
///
/// # Panics
///
/// Panics if `chunk_size` is zero.
pub fn chunk_payload(payload: &Bytes, chunk_size: usize) -> impl Iterator<Item = Bytes> + '_ {
    assert!(chunk_size > 0, "chunk size must be non-zero");

    (0..payload.len())
        .step_by(chunk_size)
        .map(move |start| payload.slice(start..payload.len().min(start + chunk_size)))
}

/// Number of chunks `chunk_payload` produces.
pub fn chunk_count(len: usize, chunk_size: usize) -> usize {
    if len == 0 {
        0
    } else {
        (len - 1) / chunk_size + 1
    }
}

/// Drives one payload to one printer.
pub struct TransferSession<'a, T: Transport> {
    /// BLE stack used for scanning and connecting.
    transport: &'a T,
    /// Printer layout and timings.
    config: &'a PrinterConfig,
    /// Current lifecycle state.
    state: TransferState,
    /// Channel for state changes.
    event_tx: broadcast::Sender<TransferState>,
}

impl<'a, T: Transport> TransferSession<'a, T> {
    /// Create an idle session.
    pub fn new(transport: &'a T, config: &'a PrinterConfig) -> Self {
        let (event_tx, _) = broadcast::channel(16);

        Self {
            transport,
            config,
            state: TransferState::Idle,
            event_tx,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<TransferState> {
        self.event_tx.subscribe()
    }

    /// Send `payload` to the printer named by `identifier` (or the first one found).
    ///
    /// The link is closed on every path that opened it. Failures are logged
    /// once and returned; a printer that cannot be found surfaces as
    /// [`Error::PrinterNotFound`] without a connection attempt.
    pub async fn send(&mut self, payload: impl Into<Bytes>, identifier: Option<&str>) -> Result<()> {
        let payload = payload.into();
        self.state = TransferState::Idle;

        self.set_state(TransferState::Resolving);
        let resolver = AddressResolver::new(self.transport, self.config);
        let address = match resolver.resolve(identifier).await {
            Ok(address) => address,
            Err(e) => return Err(self.fail(e)),
        };

        self.set_state(TransferState::Connecting);
        info!("Connecting to {}...", address);
        let mut connection = match self.transport.connect(&address).await {
            Ok(connection) => connection,
            Err(e) => return Err(self.fail(e)),
        };

        let result = self.transfer(&connection, &payload).await;
        let closed = connection.close().await;

        match (result, closed) {
            (Ok(()), Ok(())) => {
                self.set_state(TransferState::Disconnected);
                Ok(())
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(self.fail(e)),
            (Err(e), Err(close_err)) => {
                warn!("Failed to close connection after error: {}", close_err);
                Err(self.fail(e))
            }
        }
    }

    /// Everything between connect and disconnect.
    async fn transfer(&mut self, connection: &T::Connection, payload: &Bytes) -> Result<()> {
        self.set_state(TransferState::Connected);

        let mtu = connection.mtu();
        info!("Connected: {}; MTU: {}", connection.is_connected().await, mtu);

        let chunk_size = chunk_size_for_mtu(mtu)?;
        let total = chunk_count(payload.len(), chunk_size);

        self.set_state(TransferState::Sending);
        info!(
            "Sending {} bytes of data in {} chunks of {} bytes...",
            payload.len(),
            total,
            chunk_size
        );

        for (index, chunk) in chunk_payload(payload, chunk_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.chunk_delay).await;
            }

            if !connection.is_connected().await {
                return Err(Error::ConnectionLost);
            }

            connection
                .write(&self.config.write_characteristic, &chunk)
                .await
                .map_err(|e| match e {
                    Error::ConnectionLost => e,
                    other => Error::WriteFailed {
                        chunk: index + 1,
                        total,
                        reason: other.to_string(),
                    },
                })?;

            trace!("Sent chunk {}/{} ({} bytes)", index + 1, total, chunk.len());
        }

        self.set_state(TransferState::Draining);
        info!(
            "Done. Waiting {:?} before disconnecting...",
            self.config.drain_delay
        );
        tokio::time::sleep(self.config.drain_delay).await;

        Ok(())
    }

    /// Log `error`, mark the session failed and hand the error back.
    fn fail(&mut self, error: Error) -> Error {
        error!("Print failed: {}", error);
        self.set_state(TransferState::Failed);
        error
    }

    /// Update the state and emit an event.
    fn set_state(&mut self, new_state: TransferState) {
        let old_state = std::mem::replace(&mut self.state, new_state);

        if old_state != new_state {
            debug!("Transfer state changed: {} -> {}", old_state, new_state);
            let _ = self.event_tx.send(new_state);
        }
    }
}
