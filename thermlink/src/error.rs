//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] thermlink_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] thermlink_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] thermlink_types::Error),

    #[error("No printer matching {identity} found within {timeout_secs}s")]
    NotFound {
        identity: String,
        timeout_secs: u64,
    },

    #[error("No printer selected - scan first")]
    NoPrinterSelected,

    #[error("Printer not connected")]
    NotConnected,
}

impl Error {
    /// Check if retrying the same call might succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => matches!(e, thermlink_transport::Error::Unreachable { .. }),
            _ => false,
        }
    }

    /// Check if error requires scanning and connecting again
    pub fn requires_reconnect(&self) -> bool {
        match self {
            Self::NotConnected | Self::NoPrinterSelected => true,
            Self::Core(e) => e.requires_reconnect(),
            Self::Transport(e) => e.requires_reconnect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let not_found = Error::NotFound {
            identity: "GB*".into(),
            timeout_secs: 5,
        };
        assert!(not_found.is_recoverable());
        assert!(!not_found.requires_reconnect());

        let lost: Error = thermlink_transport::Error::NotConnected.into();
        assert!(lost.requires_reconnect());

        let bad_row: Error = thermlink_core::Error::ScanlineLength {
            expected: 48,
            actual: 47,
        }
        .into();
        assert!(!bad_row.is_recoverable());
        assert!(!bad_row.requires_reconnect());
    }
}
