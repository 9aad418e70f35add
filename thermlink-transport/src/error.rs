//! Transport errors

use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Printer unreachable after {attempts} connection attempts")]
    Unreachable {
        attempts: usize,
    },

    #[error("Printer does not expose service {0}")]
    ServiceMissing(Uuid),

    #[error("Printer does not expose characteristic {0}")]
    CharacteristicMissing(Uuid),

    #[error("Write failed at byte {offset} of {total}: {source}")]
    WriteFailed {
        offset: usize,
        total: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Device {0} is no longer known to the adapter")]
    DeviceGone(String),

    #[error("No Bluetooth adapter available")]
    NoAdapter,

    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),
}

impl Error {
    /// Check if the link should be considered lost
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::WriteFailed { .. } | Self::DeviceGone(_)
        )
    }
}
