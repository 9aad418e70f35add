//! Printer configuration

use std::time::Duration;

use thermlink_core::constants::{timing, PRINT_WIDTH};
use thermlink_core::PrintSettings;
use thermlink_transport::{TransportConfig, WriteMode};
use thermlink_types::DeviceIdentity;

/// Environment variable holding a printer name filter
pub const ENV_PRINTER: &str = "THERMLINK_PRINTER";

/// Everything a [`Printer`](crate::Printer) needs to find and drive a device
#[derive(Debug, Clone)]
pub struct PrinterConfig {
    /// Which printer to look for
    pub identity: DeviceIdentity,

    /// Print width in pixels
    pub width: u32,

    /// Device settings sent during init and after each image
    pub settings: PrintSettings,

    /// Pause after each image row
    pub row_delay: Duration,

    /// Apply the firmware pacing delays between commands
    pub pacing: bool,

    /// Link tuning
    pub transport: TransportConfig,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            identity: DeviceIdentity::any(),
            width: PRINT_WIDTH,
            settings: PrintSettings::default(),
            row_delay: timing::AFTER_ROW,
            pacing: true,
            transport: TransportConfig::default(),
        }
    }
}

impl PrinterConfig {
    /// Defaults, with the name filter taken from `THERMLINK_PRINTER` if set
    pub fn from_env() -> Self {
        match std::env::var(ENV_PRINTER) {
            Ok(filter) if !filter.trim().is_empty() => Self::default().with_name(filter.trim()),
            _ => Self::default(),
        }
    }

    /// Look for printers whose name starts with `prefix`
    pub fn with_name(mut self, prefix: impl Into<String>) -> Self {
        self.identity = DeviceIdentity::named(prefix);
        self
    }

    pub fn with_energy(mut self, energy: u16) -> Self {
        self.settings.energy = energy;
        self
    }

    pub fn with_speed(mut self, speed: u8) -> Self {
        self.settings.speed = speed;
        self
    }

    pub fn with_dpi(mut self, dpi: u8) -> Self {
        self.settings.dpi = dpi;
        self
    }

    /// Lines fed after every image
    pub fn with_feed_lines(mut self, lines: u16) -> Self {
        self.settings.feed_lines = lines;
        self
    }

    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.transport.scan_timeout = timeout;
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.transport.write_mode = mode;
        self
    }

    /// Skip all inter-command delays
    ///
    /// Real printers drop data without them; this is for simulated links.
    pub fn without_pacing(mut self) -> Self {
        self.pacing = false;
        self
    }
}
