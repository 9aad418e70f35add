//! Error types for thermlink-core

/// Result type alias for thermlink-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame is too short to be valid
    #[error("Frame too short: expected at least {expected} bytes, got {actual} bytes")]
    FrameTooShort {
        expected: usize,
        actual: usize,
    },

    /// Frame does not start with 0x51 0x78 or end with 0xFF
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    ChecksumMismatch {
        expected: u8,
        received: u8,
    },

    /// Unknown opcode
    #[error("Unknown opcode: 0x{0:02X}")]
    UnknownOpcode(u8),

    /// Payload does not fit in one frame
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// Scanline length does not match the print width
    #[error("Scanline is {actual} bytes, expected {expected} bytes")]
    ScanlineLength {
        expected: usize,
        actual: usize,
    },

    /// Feed or retract distance out of range
    #[error("Line count {0} out of range (0..=255)")]
    LineCountOutOfRange(u16),

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    /// Session not connected
    #[error("Session not connected - scan and connect to a printer first")]
    NotConnected,
}

impl Error {
    /// Check if error requires reconnection
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::NotConnected | Self::InvalidSessionState(_))
    }
}
