//! Device identity and information structures

use std::fmt;

use chrono::{DateTime, Utc};

/// Advertised names of the printer models this driver supports
pub const KNOWN_MODELS: &[&str] = &["X18-9556"];

/// Which printer a scan is looking for
///
/// An empty filter accepts any model in [`KNOWN_MODELS`] (exact name match).
/// A non-empty filter accepts any device whose advertised name starts with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceIdentity {
    filter: String,
}

impl DeviceIdentity {
    /// Match any supported model
    pub fn any() -> Self {
        Self::default()
    }

    /// Match devices whose name starts with `prefix`
    pub fn named(prefix: impl Into<String>) -> Self {
        Self {
            filter: prefix.into(),
        }
    }

    /// The configured filter (empty for "any known model")
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Check if this is an unqualified filter
    pub fn is_any(&self) -> bool {
        self.filter.is_empty()
    }

    /// Check an advertised name against this identity
    pub fn matches(&self, advertised: &str) -> bool {
        if self.filter.is_empty() {
            KNOWN_MODELS.contains(&advertised)
        } else {
            advertised.starts_with(&self.filter)
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filter.is_empty() {
            write!(f, "any of {:?}", KNOWN_MODELS)
        } else {
            write!(f, "{}*", self.filter)
        }
    }
}

/// A device seen during discovery
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    /// Backend-specific identifier used to reconnect to the device
    pub id: String,

    /// Advertised local name
    pub name: String,

    /// Bluetooth address, when the platform exposes it
    pub address: Option<String>,

    /// Signal strength at discovery time
    pub rssi: Option<i16>,
}

impl DeviceHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: None,
            rssi: None,
        }
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(addr) => write!(f, "{} [{}]", self.name, addr),
            None => write!(f, "{} [{}]", self.name, self.id),
        }
    }
}

/// Information about a connected printer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterInfo {
    /// Advertised name
    pub name: String,

    /// Bluetooth address
    pub address: Option<String>,

    /// Print width in pixels
    pub width: u32,

    /// MTU reported by the link (diagnostic only)
    pub mtu: Option<u16>,

    /// When the link came up
    pub connected_at: DateTime<Utc>,
}

impl fmt::Display for PrinterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Printer[{}, {}px", self.name, self.width)?;
        if let Some(mtu) = self.mtu {
            write!(f, ", MTU {}", mtu)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_matches_known_models_exactly() {
        let identity = DeviceIdentity::any();

        assert!(identity.is_any());
        assert!(identity.matches("X18-9556"));
        assert!(!identity.matches("X18-9556-B"));
        assert!(!identity.matches("GB01"));
        assert!(!identity.matches(""));
    }

    #[test]
    fn test_named_matches_by_prefix() {
        let identity = DeviceIdentity::named("X18");

        assert!(!identity.is_any());
        assert!(identity.matches("X18-9556"));
        assert!(identity.matches("X18"));
        assert!(!identity.matches("MX18"));
        assert!(!identity.matches("X1"));
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceIdentity::named("GB").to_string(), "GB*");

        let mut handle = DeviceHandle::new("hci0/dev_AA", "X18-9556");
        assert_eq!(handle.to_string(), "X18-9556 [hci0/dev_AA]");
        handle.address = Some("AA:BB:CC:DD:EE:FF".into());
        assert_eq!(handle.to_string(), "X18-9556 [AA:BB:CC:DD:EE:FF]");
    }
}
