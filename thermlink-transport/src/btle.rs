//! [`Link`] over the host Bluetooth adapter via btleplug

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, Service, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::{future, StreamExt};
use thermlink_types::DeviceHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::gatt::{
    CharProps, CharacteristicInfo, ConnectionParams, ServiceInfo, WriteMode, SERVICE_UUID,
};
use crate::{AdvertisementStream, Link, NotificationStream};

/// Host adapter link
pub struct BtleplugLink {
    adapter: Adapter,
    peripheral: Option<Peripheral>,
    characteristics: HashMap<Uuid, Characteristic>,
}

impl BtleplugLink {
    /// Open the first Bluetooth adapter on the host
    pub async fn new() -> Result<Self> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoAdapter)?;

        match adapter.adapter_info().await {
            Ok(info) => debug!("Using adapter {}", info),
            Err(e) => debug!("Adapter info unavailable: {}", e),
        }

        Ok(Self::with_adapter(adapter))
    }

    /// Use a specific adapter
    pub fn with_adapter(adapter: Adapter) -> Self {
        Self {
            adapter,
            peripheral: None,
            characteristics: HashMap::new(),
        }
    }

    fn peripheral(&self) -> Result<&Peripheral> {
        self.peripheral.as_ref().ok_or(Error::NotConnected)
    }

    fn characteristic(&self, uuid: Uuid) -> Result<&Characteristic> {
        self.characteristics
            .get(&uuid)
            .ok_or(Error::CharacteristicMissing(uuid))
    }

    async fn find_peripheral(&self, id: &str) -> Result<Peripheral> {
        self.adapter
            .peripherals()
            .await?
            .into_iter()
            .find(|p| peripheral_key(p) == id)
            .ok_or_else(|| Error::DeviceGone(id.to_string()))
    }
}

fn peripheral_key(peripheral: &Peripheral) -> String {
    format!("{:?}", peripheral.id())
}

async fn describe(peripheral: Peripheral) -> Option<DeviceHandle> {
    let properties = match peripheral.properties().await {
        Ok(Some(properties)) => properties,
        Ok(None) => return None,
        Err(e) => {
            trace!("No properties for {:?}: {}", peripheral.id(), e);
            return None;
        }
    };

    // Nameless advertisers cannot match any identity
    let name = properties.local_name?;

    Some(DeviceHandle {
        id: peripheral_key(&peripheral),
        name,
        address: Some(properties.address.to_string()),
        rssi: properties.rssi,
    })
}

fn char_props(flags: CharPropFlags) -> CharProps {
    let mut props = CharProps::empty();
    props.set(CharProps::READ, flags.contains(CharPropFlags::READ));
    props.set(CharProps::WRITE, flags.contains(CharPropFlags::WRITE));
    props.set(
        CharProps::WRITE_WITHOUT_RESPONSE,
        flags.contains(CharPropFlags::WRITE_WITHOUT_RESPONSE),
    );
    props.set(CharProps::NOTIFY, flags.contains(CharPropFlags::NOTIFY));
    props.set(CharProps::INDICATE, flags.contains(CharPropFlags::INDICATE));
    props
}

/// Addressable characteristics, taken from the printer service only
fn printer_characteristics(services: &BTreeSet<Service>) -> HashMap<Uuid, Characteristic> {
    services
        .iter()
        .filter(|service| service.uuid == SERVICE_UUID)
        .flat_map(|service| service.characteristics.iter())
        .map(|characteristic| (characteristic.uuid, characteristic.clone()))
        .collect()
}

#[async_trait]
impl Link for BtleplugLink {
    async fn start_scan(&mut self) -> Result<AdvertisementStream> {
        let events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;

        let adapter = self.adapter.clone();
        let adverts = events.filter_map(move |event| {
            let adapter = adapter.clone();
            async move {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                    _ => return None,
                };
                let peripheral = adapter.peripheral(&id).await.ok()?;
                describe(peripheral).await
            }
        });

        Ok(Box::pin(adverts))
    }

    async fn stop_scan(&mut self) -> Result<()> {
        self.adapter.stop_scan().await?;
        Ok(())
    }

    async fn connect(&mut self, device: &DeviceHandle, params: &ConnectionParams) -> Result<bool> {
        // Start from a fresh client
        if let Some(old) = self.peripheral.take() {
            if let Err(e) = old.disconnect().await {
                debug!("Dropping stale client: {}", e);
            }
        }
        self.characteristics.clear();

        let peripheral = self.find_peripheral(&device.id).await?;
        // Connection parameters are negotiated by the OS on this backend
        trace!("Requested connection parameters: {:?}", params);

        let result = peripheral.connect().await;
        self.peripheral = Some(peripheral);

        match result {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!("Connect to {} reported failure: {}", device, e);
                Ok(false)
            }
        }
    }

    async fn is_connected(&self) -> Result<bool> {
        match &self.peripheral {
            Some(peripheral) => Ok(peripheral.is_connected().await?),
            None => Ok(false),
        }
    }

    async fn mtu(&self) -> Result<Option<u16>> {
        Ok(None)
    }

    async fn services(&mut self) -> Result<Vec<ServiceInfo>> {
        let peripheral = self.peripheral()?.clone();
        peripheral.discover_services().await?;

        let discovered = peripheral.services();
        self.characteristics = printer_characteristics(&discovered);

        let services: Vec<ServiceInfo> = discovered
            .iter()
            .map(|service| ServiceInfo {
                uuid: service.uuid,
                characteristics: service
                    .characteristics
                    .iter()
                    .map(|characteristic| CharacteristicInfo {
                        uuid: characteristic.uuid,
                        properties: char_props(characteristic.properties),
                    })
                    .collect(),
            })
            .collect();

        debug!("Discovered {} services", services.len());
        Ok(services)
    }

    async fn write(&mut self, characteristic: Uuid, data: &[u8], mode: WriteMode) -> Result<()> {
        let peripheral = self.peripheral()?;
        let target = self.characteristic(characteristic)?;
        let write_type = match mode {
            WriteMode::WithResponse => WriteType::WithResponse,
            WriteMode::WithoutResponse => WriteType::WithoutResponse,
        };

        peripheral.write(target, data, write_type).await?;
        Ok(())
    }

    async fn subscribe(&mut self, characteristic: Uuid) -> Result<NotificationStream> {
        let peripheral = self.peripheral()?;
        let target = self.characteristic(characteristic)?;

        peripheral.subscribe(target).await?;
        let notifications = peripheral.notifications().await?;

        Ok(Box::pin(notifications.filter_map(move |n| {
            future::ready((n.uuid == characteristic).then_some(n.value))
        })))
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.characteristics.clear();
        if let Some(peripheral) = self.peripheral.take() {
            if let Err(e) = peripheral.disconnect().await {
                warn!("Disconnect failed: {}", e);
                return Err(e.into());
            }
        }
        Ok(())
    }
}
