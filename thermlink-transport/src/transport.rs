//! BLE transport for 0x51 0x78 printers
//!
//! Wraps a [`Link`] with the printer-specific connection procedure:
//! name-filtered discovery, retried connects, GATT validation, notification
//! subscription and flow-controlled chunked writes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use thermlink_core::constants::{self, timing};
use thermlink_types::{DeviceHandle, DeviceIdentity, PrinterInfo};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::flow::FlowController;
use crate::gatt::{ConnectionParams, NOTIFY_CHAR_UUID, SERVICE_UUID, WRITE_CHAR_UUID, WriteMode};
use crate::Link;

/// Connection and write tuning
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// How long a scan looks for a matching advertisement
    pub scan_timeout: Duration,

    /// Connect attempts before giving up
    pub connect_attempts: usize,

    /// Wait after a reported failure before re-checking the link
    pub connect_grace: Duration,

    /// Wait between attempts
    pub connect_backoff: Duration,

    /// Wait after connecting before querying MTU and services
    pub connect_settle: Duration,

    /// Wait after subscribing before the link is handed out
    pub stabilise: Duration,

    /// Bytes per write
    pub chunk_size: usize,

    pub write_mode: WriteMode,

    pub connection_params: ConnectionParams,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(constants::DEFAULT_SCAN_TIMEOUT),
            connect_attempts: constants::MAX_CONNECT_ATTEMPTS,
            connect_grace: timing::CONNECT_GRACE,
            connect_backoff: timing::CONNECT_BACKOFF,
            connect_settle: timing::CONNECT_SETTLE,
            stabilise: timing::STABILISE,
            chunk_size: constants::CHUNK_SIZE,
            write_mode: WriteMode::default(),
            connection_params: ConnectionParams::default(),
        }
    }
}

/// An established link
struct Connection {
    device: DeviceHandle,
    mtu: Option<u16>,
    connected_at: DateTime<Utc>,
    pump: JoinHandle<()>,
}

/// BLE transport for a single printer
pub struct BleTransport<L: Link> {
    link: L,
    config: TransportConfig,
    flow: FlowController,
    connection: Option<Connection>,

    /// Name of the last printer matched by an unqualified scan
    remembered_name: Option<String>,
}

impl<L: Link> BleTransport<L> {
    /// Create a transport over `link` with default tuning
    pub fn new(link: L) -> Self {
        Self::with_config(link, TransportConfig::default())
    }

    pub fn with_config(link: L, config: TransportConfig) -> Self {
        Self {
            link,
            config,
            flow: FlowController::new(),
            connection: None,
            remembered_name: None,
        }
    }

    /// Set the write mode
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.config.write_mode = mode;
        self
    }

    /// Set the chunk size (at least one byte)
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size.max(1);
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Switch write mode on a live transport
    pub fn set_write_mode(&mut self, mode: WriteMode) {
        debug!("Write mode set to {:?}", mode);
        self.config.write_mode = mode;
    }

    /// Scan until a device matching `identity` shows up or `timeout_after`
    /// elapses
    pub async fn scan(
        &mut self,
        identity: &DeviceIdentity,
        timeout_after: Duration,
    ) -> Result<Option<DeviceHandle>> {
        info!("Scanning for {} ({:?})", identity, timeout_after);

        let mut adverts = self.link.start_scan().await?;
        let search = async {
            while let Some(device) = adverts.next().await {
                if identity.matches(&device.name) {
                    return Some(device);
                }
                trace!("Skipping {}", device);
            }
            None
        };
        let found = timeout(timeout_after, search).await.unwrap_or(None);
        drop(adverts);

        if let Err(e) = self.link.stop_scan().await {
            warn!("Failed to stop scan: {}", e);
        }

        match &found {
            Some(device) => {
                info!("Found printer {}", device);
                if identity.is_any() {
                    self.remembered_name = Some(device.name.clone());
                }
            }
            None => info!("No printer matching {} found", identity),
        }

        Ok(found)
    }

    /// Connect to `device` and prepare it for writes
    pub async fn connect(&mut self, device: &DeviceHandle) -> Result<PrinterInfo> {
        if self.connection.is_some() {
            return Err(Error::AlreadyConnected);
        }

        self.establish(device).await?;

        sleep(self.config.connect_settle).await;

        let mtu = match self.link.mtu().await {
            Ok(mtu) => mtu,
            Err(e) => {
                debug!("MTU not available: {}", e);
                None
            }
        };
        debug!("Negotiated MTU: {:?}", mtu);

        if let Err(e) = self.validate_services().await {
            warn!("{} is not a usable printer: {}", device, e);
            let _ = self.link.disconnect().await;
            return Err(e);
        }

        self.flow.reset();
        let notifications = match self.link.subscribe(NOTIFY_CHAR_UUID).await {
            Ok(stream) => stream,
            Err(e) => {
                let _ = self.link.disconnect().await;
                return Err(e);
            }
        };
        let pump = self.flow.spawn_pump(notifications);

        sleep(self.config.stabilise).await;

        let connected_at = Utc::now();
        self.connection = Some(Connection {
            device: device.clone(),
            mtu,
            connected_at,
            pump,
        });

        info!("Connected to {}", device);

        Ok(PrinterInfo {
            name: device.name.clone(),
            address: device.address.clone(),
            width: constants::PRINT_WIDTH,
            mtu,
            connected_at,
        })
    }

    /// Bring the link up, retrying as configured
    async fn establish(&mut self, device: &DeviceHandle) -> Result<()> {
        let attempts = self.config.connect_attempts.max(1);

        for attempt in 1..=attempts {
            if attempt > 1 {
                sleep(self.config.connect_backoff).await;
            }
            debug!("Connecting to {} (attempt {}/{})", device, attempt, attempts);

            let reported = match self
                .link
                .connect(device, &self.config.connection_params)
                .await
            {
                Ok(ok) => ok,
                Err(e) => {
                    warn!("Connect attempt {} failed: {}", attempt, e);
                    false
                }
            };
            if reported {
                return Ok(());
            }

            // The platform may report failure while the link still comes up
            sleep(self.config.connect_grace).await;
            match self.link.is_connected().await {
                Ok(true) => {
                    warn!("Link is up despite the failed connect report");
                    return Ok(());
                }
                Ok(false) => {}
                Err(e) => debug!("Connection re-check failed: {}", e),
            }
        }

        Err(Error::Unreachable { attempts })
    }

    async fn validate_services(&mut self) -> Result<()> {
        let services = self.link.services().await?;
        let service = services
            .iter()
            .find(|s| s.uuid == SERVICE_UUID)
            .ok_or(Error::ServiceMissing(SERVICE_UUID))?;

        for uuid in [WRITE_CHAR_UUID, NOTIFY_CHAR_UUID] {
            let characteristic = service
                .characteristic(uuid)
                .ok_or(Error::CharacteristicMissing(uuid))?;
            trace!("{}: {:?}", uuid, characteristic.properties);
        }
        Ok(())
    }

    /// Write `data` to the printer in fixed-size chunks
    ///
    /// Each chunk waits for the printer to be un-paused before it goes out.
    /// Empty input writes nothing.
    pub async fn write_chunked(&mut self, data: &[u8]) -> Result<()> {
        if self.connection.is_none() {
            return Err(Error::NotConnected);
        }

        let total = data.len();
        let mut offset = 0;

        for chunk in data.chunks(self.config.chunk_size.max(1)) {
            self.flow.wait_ready().await;

            trace!("Writing {} bytes at {}/{}", chunk.len(), offset, total);
            self.link
                .write(WRITE_CHAR_UUID, chunk, self.config.write_mode)
                .await
                .map_err(|e| Error::WriteFailed {
                    offset,
                    total,
                    source: Box::new(e),
                })?;
            offset += chunk.len();
        }

        Ok(())
    }

    /// Close the link
    ///
    /// Safe to call when not connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };

        connection.pump.abort();
        info!("Disconnecting from {}", connection.device);
        self.link.disconnect().await
    }

    /// Whether a link was established and not closed since
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Ask the link whether it is still up
    ///
    /// A link found down is torn down locally.
    pub async fn check_link(&mut self) -> Result<bool> {
        if self.connection.is_none() {
            return Ok(false);
        }

        if self.link.is_connected().await? {
            return Ok(true);
        }

        if let Some(connection) = self.connection.take() {
            warn!("Link to {} dropped", connection.device);
            connection.pump.abort();
        }
        Ok(false)
    }

    /// Connected device
    pub fn device(&self) -> Option<&DeviceHandle> {
        self.connection.as_ref().map(|c| &c.device)
    }

    /// MTU reported when the link came up
    pub fn negotiated_mtu(&self) -> Option<u16> {
        self.connection.as_ref().and_then(|c| c.mtu)
    }

    /// When the current link came up
    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connection.as_ref().map(|c| c.connected_at)
    }

    /// Name remembered by the last unqualified scan
    pub fn remembered_name(&self) -> Option<&str> {
        self.remembered_name.as_deref()
    }

    pub fn flow(&self) -> &FlowController {
        &self.flow
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

impl<L: Link> Drop for BleTransport<L> {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            warn!("BLE transport dropped while still connected");
            connection.pump.abort();
        }
    }
}
