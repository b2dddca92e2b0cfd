//! In-memory transport used by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use uuid::Uuid;

use catprinter_ble::ble::{
    Advertisement, AdvertisementInfo, Connection, DiscoveredDevice, ScanPredicate,
};
use catprinter_ble::{Error, ResolvedAddress, Result, Transport};

/// One recorded characteristic write.
#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub characteristic: Uuid,
    pub data: Vec<u8>,
    pub at: Instant,
}

/// Everything the fake saw.
#[derive(Debug, Default)]
pub struct Record {
    pub scans: Vec<Duration>,
    pub connects: Vec<ResolvedAddress>,
    pub writes: Vec<WriteRecord>,
    pub closes: Vec<Instant>,
}

/// Scripted transport: a fixed set of advertisements and a link with a fixed MTU.
pub struct FakeTransport {
    advertisements: Vec<AdvertisementInfo>,
    mtu: u16,
    refuse_connect: bool,
    fail_write_at: Option<usize>,
    drop_link_at: Option<usize>,
    record: Arc<Mutex<Record>>,
}

impl FakeTransport {
    pub fn new(mtu: u16) -> Self {
        Self {
            advertisements: Vec::new(),
            mtu,
            refuse_connect: false,
            fail_write_at: None,
            drop_link_at: None,
            record: Arc::new(Mutex::new(Record::default())),
        }
    }

    pub fn with_advertisement(mut self, advertisement: AdvertisementInfo) -> Self {
        self.advertisements.push(advertisement);
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    /// Make the write with this 0-based index fail.
    pub fn failing_write_at(mut self, index: usize) -> Self {
        self.fail_write_at = Some(index);
        self
    }

    /// Report the link as down once this many writes went through.
    pub fn dropping_link_at(mut self, index: usize) -> Self {
        self.drop_link_at = Some(index);
        self
    }

    pub fn record(&self) -> parking_lot::MutexGuard<'_, Record> {
        self.record.lock()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    type Connection = FakeConnection;

    async fn scan(
        &self,
        filter: &ScanPredicate<'_>,
        timeout: Duration,
    ) -> Result<Option<DiscoveredDevice>> {
        self.record.lock().scans.push(timeout);

        let hit = self
            .advertisements
            .iter()
            .find(|adv| filter(*adv as &dyn Advertisement));

        if let Some(hit) = hit {
            return Ok(Some(hit.clone().into_device()));
        }

        tokio::time::sleep(timeout).await;
        Ok(None)
    }

    async fn connect(&self, address: &ResolvedAddress) -> Result<FakeConnection> {
        self.record.lock().connects.push(address.clone());

        if self.refuse_connect {
            return Err(Error::ConnectionFailed {
                address: address.to_string(),
                reason: "peripheral refused".to_string(),
            });
        }

        Ok(FakeConnection {
            mtu: self.mtu,
            fail_write_at: self.fail_write_at,
            drop_link_at: self.drop_link_at,
            closed: false,
            record: self.record.clone(),
        })
    }
}

pub struct FakeConnection {
    mtu: u16,
    fail_write_at: Option<usize>,
    drop_link_at: Option<usize>,
    closed: bool,
    record: Arc<Mutex<Record>>,
}

#[async_trait]
impl Connection for FakeConnection {
    fn mtu(&self) -> u16 {
        self.mtu
    }

    async fn is_connected(&self) -> bool {
        let written = self.record.lock().writes.len();
        !self.closed && self.drop_link_at.map_or(true, |at| written < at)
    }

    async fn write(&self, characteristic: &Uuid, data: &[u8]) -> Result<()> {
        let mut record = self.record.lock();

        if self.fail_write_at == Some(record.writes.len()) {
            return Err(Error::CharacteristicNotFound {
                uuid: characteristic.to_string(),
            });
        }

        record.writes.push(WriteRecord {
            characteristic: *characteristic,
            data: data.to_vec(),
            at: Instant::now(),
        });
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.record.lock().closes.push(Instant::now());
        }
        Ok(())
    }
}

/// Tracing layer counting error-level events.
#[derive(Clone, Default)]
pub struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Assert `actual` is `expected`, allowing for the timer's millisecond rounding.
pub fn assert_elapsed(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(2),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}
