//! Printer opcode definitions

use std::fmt;

use crate::error::{Error, Result};

/// Protocol opcodes
///
/// The third byte of every frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // Paper movement
    RetractPaper = 0xA0,
    FeedPaper = 0xA1,

    // Image transfer
    PrintRow = 0xA2,
    Lattice = 0xA6,

    // Device control
    DeviceState = 0xA3,
    SetDpi = 0xA4,
    UpdateDevice = 0xA9,
    SetEnergy = 0xAF,
    SetSpeed = 0xBD,
    DrawingMode = 0xBE,

    // Notifications (from device)
    FlowControl = 0xAE,
}

impl Opcode {
    /// Check if this opcode is only ever sent by the device
    pub fn is_notification(self) -> bool {
        matches!(self, Self::FlowControl)
    }

    /// Get opcode name
    pub fn name(self) -> &'static str {
        match self {
            Self::RetractPaper => "RETRACT_PAPER",
            Self::FeedPaper => "FEED_PAPER",
            Self::PrintRow => "PRINT_ROW",
            Self::Lattice => "LATTICE",
            Self::DeviceState => "DEVICE_STATE",
            Self::SetDpi => "SET_DPI",
            Self::UpdateDevice => "UPDATE_DEVICE",
            Self::SetEnergy => "SET_ENERGY",
            Self::SetSpeed => "SET_SPEED",
            Self::DrawingMode => "DRAWING_MODE",
            Self::FlowControl => "FLOW_CONTROL",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0xA0 => Ok(Self::RetractPaper),
            0xA1 => Ok(Self::FeedPaper),
            0xA2 => Ok(Self::PrintRow),
            0xA3 => Ok(Self::DeviceState),
            0xA4 => Ok(Self::SetDpi),
            0xA6 => Ok(Self::Lattice),
            0xA9 => Ok(Self::UpdateDevice),
            0xAE => Ok(Self::FlowControl),
            0xAF => Ok(Self::SetEnergy),
            0xBD => Ok(Self::SetSpeed),
            0xBE => Ok(Self::DrawingMode),
            _ => Err(Error::UnknownOpcode(value)),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_conversion() {
        assert_eq!(u8::from(Opcode::PrintRow), 0xA2);
        assert_eq!(Opcode::try_from(0xA6).unwrap(), Opcode::Lattice);
        assert_eq!(Opcode::try_from(0xBD).unwrap(), Opcode::SetSpeed);
    }

    #[test]
    fn test_all_opcodes_roundtrip() {
        let all = [
            Opcode::RetractPaper,
            Opcode::FeedPaper,
            Opcode::PrintRow,
            Opcode::Lattice,
            Opcode::DeviceState,
            Opcode::SetDpi,
            Opcode::UpdateDevice,
            Opcode::SetEnergy,
            Opcode::SetSpeed,
            Opcode::DrawingMode,
            Opcode::FlowControl,
        ];
        for op in all {
            assert_eq!(Opcode::try_from(u8::from(op)).unwrap(), op);
        }
    }

    #[test]
    fn test_opcode_classification() {
        assert!(Opcode::FlowControl.is_notification());
        assert!(!Opcode::FeedPaper.is_notification());
    }

    #[test]
    fn test_unknown_opcode() {
        assert!(matches!(Opcode::try_from(0x42), Err(Error::UnknownOpcode(0x42))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::SetEnergy.to_string(), "SET_ENERGY(0xAF)");
    }
}
