//! # thermlink
//!
//! Driver for BLE thermal printers speaking the 0x51 0x78 command protocol
//! (X18-9556 and compatible "cat printers").
//!
//! ## Features
//!
//! - Name-filtered discovery with a built-in model allow-list
//! - Connection retries with the spurious-failure re-check
//! - Firmware init and image sequences with the required pacing
//! - Device-driven pause/resume flow control on every write
//!
//! ## Quick Start
//!
//! ```no_run
//! use thermlink::{Printer, PrinterConfig};
//!
//! #[tokio::main]
//! async fn main() -> thermlink::Result<()> {
//!     let mut printer = Printer::open(PrinterConfig::from_env()).await?;
//!     printer.scan_and_connect().await?;
//!
//!     // One solid black line, 384 px wide
//!     printer.print_rows([&[0xFFu8; 48][..]]).await?;
//!
//!     printer.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod printer;

// Re-exports
pub use config::{PrinterConfig, ENV_PRINTER};
pub use error::{Error, Result};
pub use printer::Printer;

// Re-export types
pub use thermlink_core::{Frame, Opcode, PrintSettings, SessionState};
pub use thermlink_transport::{BtleplugLink, Link, TransportConfig, WriteMode};
pub use thermlink_types::{DeviceHandle, DeviceIdentity, PrinterInfo, Raster};
