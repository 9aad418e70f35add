//! Transport layer for 0x51 0x78 thermal printers
//!
//! Provides BLE discovery, connection management and flow-controlled
//! chunked writes. The radio itself sits behind the [`Link`] trait so the
//! connection logic can run against a real adapter ([`BtleplugLink`]) or a
//! scripted one in tests.

pub mod btle;
pub mod error;
pub mod flow;
pub mod gatt;
pub mod transport;

pub use btle::BtleplugLink;
pub use error::{Error, Result};
pub use flow::{FlowController, FlowState};
pub use gatt::{
    CharProps, CharacteristicInfo, ConnectionParams, ServiceInfo, WriteMode, NOTIFY_CHAR_UUID,
    SERVICE_UUID, WRITE_CHAR_UUID,
};
pub use transport::{BleTransport, TransportConfig};
pub use uuid::Uuid;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thermlink_types::DeviceHandle;

/// Devices reported while a scan runs
pub type AdvertisementStream = Pin<Box<dyn Stream<Item = DeviceHandle> + Send>>;

/// Raw notification payloads from a subscribed characteristic
pub type NotificationStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Radio primitives the transport is built on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Link: Send + Sync {
    /// Start discovery and stream what the adapter sees
    async fn start_scan(&mut self) -> Result<AdvertisementStream>;

    /// Stop discovery
    async fn stop_scan(&mut self) -> Result<()>;

    /// Open a link to `device`
    ///
    /// `Ok(false)` means the platform reported failure without an error.
    /// Some stacks report failure while the link actually comes up, so the
    /// caller re-checks [`Link::is_connected`].
    async fn connect(&mut self, device: &DeviceHandle, params: &ConnectionParams)
        -> Result<bool>;

    /// Live connection status
    async fn is_connected(&self) -> Result<bool>;

    /// Negotiated ATT MTU, if the platform exposes it
    async fn mtu(&self) -> Result<Option<u16>>;

    /// Discover services and characteristics
    async fn services(&mut self) -> Result<Vec<ServiceInfo>>;

    /// Write one chunk to a characteristic
    async fn write(&mut self, characteristic: Uuid, data: &[u8], mode: WriteMode) -> Result<()>;

    /// Enable notifications and stream them
    async fn subscribe(&mut self, characteristic: Uuid) -> Result<NotificationStream>;

    /// Drop the link
    async fn disconnect(&mut self) -> Result<()>;
}
