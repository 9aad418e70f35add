//! Type definitions for thermlink

pub mod device;
pub mod error;
pub mod raster;

pub use device::{DeviceHandle, DeviceIdentity, PrinterInfo, KNOWN_MODELS};
pub use error::{Error, Result};
pub use raster::Raster;
