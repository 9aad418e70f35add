//! GATT layout of the printer and link-level parameter types

use bitflags::bitflags;
use uuid::Uuid;

/// Printer service
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000ae30_0000_1000_8000_00805f9b34fb);

/// Host to printer commands
pub const WRITE_CHAR_UUID: Uuid = Uuid::from_u128(0x0000ae01_0000_1000_8000_00805f9b34fb);

/// Printer to host notifications (flow control)
pub const NOTIFY_CHAR_UUID: Uuid = Uuid::from_u128(0x0000ae02_0000_1000_8000_00805f9b34fb);

bitflags! {
    /// Characteristic capabilities
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CharProps: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const WRITE_WITHOUT_RESPONSE = 1 << 2;
        const NOTIFY = 1 << 3;
        const INDICATE = 1 << 4;
    }
}

/// A characteristic discovered on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicInfo {
    pub uuid: Uuid,
    pub properties: CharProps,
}

/// A service discovered on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub uuid: Uuid,
    pub characteristics: Vec<CharacteristicInfo>,
}

impl ServiceInfo {
    /// Look up a characteristic of this service
    pub fn characteristic(&self, uuid: Uuid) -> Option<&CharacteristicInfo> {
        self.characteristics.iter().find(|c| c.uuid == uuid)
    }
}

/// Whether writes wait for a link-layer acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    WithResponse,
    #[default]
    WithoutResponse,
}

/// Connection parameters requested from the peer
///
/// Intervals are in 1.25 ms units, the supervision timeout in 10 ms units.
/// The defaults are deliberately loose; the printers drop tighter links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionParams {
    pub min_interval: u16,
    pub max_interval: u16,
    pub latency: u16,
    pub supervision_timeout: u16,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            min_interval: 24,
            max_interval: 40,
            latency: 0,
            supervision_timeout: 600,
        }
    }
}
