//! Printer session state machine
//!
//! ```text
//! Idle ─scan─> Scanning ─found─> Connecting ─ok─> Uninitialized ─init─> Ready
//!  ^              │                  │                                  │  ^
//!  └──not found───┘                  │                            print │  │ done
//!  └──────────────unreachable────────┘                                  v  │
//!                                                                     Printing
//! any state ─disconnect / link failure─> Disconnected ─scan─> Scanning
//! ```

use std::sync::Arc;

use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing started yet
    Idle,

    /// Looking for a printer
    Scanning,

    /// Printer found, link being established
    Connecting,

    /// Connected, init sequence not sent yet
    Uninitialized,

    /// Connected and initialized
    Ready,

    /// Image transfer in progress
    Printing,

    /// Link closed or lost
    Disconnected,
}

impl SessionState {
    /// Check if a link to the printer is up
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Ready | Self::Printing)
    }
}

/// Session manager
///
/// Tracks where the printer lifecycle currently is and rejects out-of-order
/// transitions. Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<parking_lot::RwLock<SessionInner>>,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,

    /// Name of the printer this session is bound to
    printer_name: Option<String>,
}

impl Session {
    /// Create a new idle session
    pub fn new() -> Self {
        Self {
            inner: Arc::new(parking_lot::RwLock::new(SessionInner {
                state: SessionState::Idle,
                printer_name: None,
            })),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        self.inner.read().state
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Check if the init sequence has been sent on this connection
    pub fn is_initialized(&self) -> bool {
        matches!(self.state(), SessionState::Ready | SessionState::Printing)
    }

    /// Name of the printer found by the last successful scan
    pub fn printer_name(&self) -> Option<String> {
        self.inner.read().printer_name.clone()
    }

    fn transition(
        &self,
        allowed: &[SessionState],
        next: SessionState,
        action: &str,
    ) -> Result<()> {
        let mut inner = self.inner.write();

        if !allowed.contains(&inner.state) {
            return Err(Error::InvalidSessionState(format!(
                "Cannot {} from state: {:?}",
                action, inner.state
            )));
        }

        inner.state = next;
        Ok(())
    }

    /// Start a scan
    pub fn begin_scan(&self) -> Result<()> {
        self.transition(
            &[SessionState::Idle, SessionState::Disconnected],
            SessionState::Scanning,
            "scan",
        )
    }

    /// Scan finished; `found` carries the matched printer name
    pub fn finish_scan(&self, found: Option<String>) -> Result<()> {
        let next = if found.is_some() {
            SessionState::Connecting
        } else {
            SessionState::Idle
        };
        self.transition(&[SessionState::Scanning], next, "finish scan")?;

        if found.is_some() {
            self.inner.write().printer_name = found;
        }
        Ok(())
    }

    /// Link established
    pub fn connected(&self) -> Result<()> {
        self.transition(
            &[SessionState::Connecting],
            SessionState::Uninitialized,
            "complete connection",
        )
    }

    /// Connection attempts exhausted or the device was unusable
    pub fn connect_failed(&self) -> Result<()> {
        self.transition(&[SessionState::Connecting], SessionState::Idle, "fail connection")
    }

    /// Init sequence sent
    pub fn initialized(&self) -> Result<()> {
        self.transition(
            &[SessionState::Uninitialized],
            SessionState::Ready,
            "initialize",
        )
    }

    /// Start an image transfer
    pub fn begin_print(&self) -> Result<()> {
        let state = self.state();
        if !state.is_connected() {
            return Err(Error::NotConnected);
        }
        self.transition(&[SessionState::Ready], SessionState::Printing, "print")
    }

    /// Image transfer complete
    pub fn finish_print(&self) -> Result<()> {
        self.transition(&[SessionState::Printing], SessionState::Ready, "finish print")
    }

    /// Close session
    ///
    /// Valid from any state. The printer name is kept so it can be reported
    /// after disconnecting.
    pub fn close(&self) {
        self.inner.write().state = SessionState::Disconnected;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
