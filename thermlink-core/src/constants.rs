//! Protocol constants

use std::time::Duration;

/// Frame start bytes
pub const PREFIX: [u8; 2] = [0x51, 0x78];

/// Frame end byte
pub const SUFFIX: u8 = 0xFF;

/// Direction byte for host to device frames
pub const DIRECTION_HOST: u8 = 0x00;

/// Direction byte for device to host frames
pub const DIRECTION_DEVICE: u8 = 0x01;

/// Largest frame the device accepts
pub const MAX_FRAME_SIZE: usize = 256;

/// Largest payload a single frame may carry
pub const MAX_PAYLOAD_SIZE: usize = 247;

/// Bytes a frame adds around its payload (6 header + checksum + suffix)
pub const FRAME_OVERHEAD: usize = 8;

/// Bytes per radio write, independent of the negotiated MTU
pub const CHUNK_SIZE: usize = 200;

/// Printable width of the print head in pixels
pub const PRINT_WIDTH: u32 = 384;

/// Connection attempts before giving up
pub const MAX_CONNECT_ATTEMPTS: usize = 3;

/// Default scan duration (seconds)
pub const DEFAULT_SCAN_TIMEOUT: u64 = 5;

/// Lattice payloads (sent with opcode 0xA6)
pub mod lattice {
    /// Opens an image transfer
    pub const START: [u8; 11] = [
        0xAA, 0x55, 0x17, 0x38, 0x44, 0x5F, 0x5F, 0x5F, 0x44, 0x38, 0x2C,
    ];

    /// Closes an image transfer
    pub const END: [u8; 11] = [
        0xAA, 0x55, 0x17, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x17,
    ];
}

/// Flow control notifications pushed by the device
pub mod flow {
    /// Device buffer is full, stop sending
    pub const PAUSE: [u8; 9] = [0x51, 0x78, 0xAE, 0x01, 0x01, 0x00, 0x10, 0x70, 0xFF];

    /// Device buffer drained, continue
    pub const RESUME: [u8; 9] = [0x51, 0x78, 0xAE, 0x01, 0x01, 0x00, 0x00, 0x00, 0xFF];

    /// Notifications are 8 bytes long and match the first 8 bytes of a pattern
    pub const MATCH_LEN: usize = 8;
}

/// Default device settings sent during initialization
pub mod defaults {
    /// 200 DPI
    pub const DPI: u8 = 0x36;

    /// Print speed before printing
    pub const SPEED: u8 = 0x10;

    /// Print speed after an image, before feeding
    pub const FEED_SPEED: u8 = 0x08;

    /// Heating energy
    pub const ENERGY: u16 = 0x7FFF;

    /// Lines fed after each image
    pub const FEED_LINES: u16 = 0x0080;
}

/// Pacing the firmware needs between commands
pub mod timing {
    use super::Duration;

    pub const AFTER_STATE_QUERY: Duration = Duration::from_millis(100);
    pub const AFTER_COMMAND: Duration = Duration::from_millis(50);
    pub const FLUSH: Duration = Duration::from_millis(200);
    pub const AFTER_LATTICE: Duration = Duration::from_millis(100);
    pub const AFTER_ROW: Duration = Duration::from_millis(30);

    /// Wait before re-checking a connect call that reported failure
    pub const CONNECT_GRACE: Duration = Duration::from_millis(200);

    /// Wait between failed connect attempts
    pub const CONNECT_BACKOFF: Duration = Duration::from_millis(500);

    /// Wait before querying MTU and services after connecting
    pub const CONNECT_SETTLE: Duration = Duration::from_millis(200);

    /// Wait for the printer to stabilise before first use
    pub const STABILISE: Duration = Duration::from_secs(2);
}
