//! Device-driven flow control
//!
//! The printer pushes a "pause" notification when its buffer fills and a
//! "resume" notification when it drains. The notification pump posts the
//! new state into a watch channel; the write loop waits on that channel
//! before every chunk. There is no timeout: a printer that never resumes
//! stalls the writer until the caller gives up and disconnects.

use std::sync::Arc;

use futures::StreamExt;
use thermlink_core::constants::flow::{MATCH_LEN, PAUSE, RESUME};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::NotificationStream;

/// Whether the printer accepts data right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Running,
    Paused,
}

/// Shared pause/resume gate
///
/// Cheap to clone; all clones observe the same state.
#[derive(Debug, Clone)]
pub struct FlowController {
    state: Arc<watch::Sender<FlowState>>,
}

impl FlowController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FlowState::Running);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Current state
    pub fn state(&self) -> FlowState {
        *self.state.borrow()
    }

    pub fn is_paused(&self) -> bool {
        self.state() == FlowState::Paused
    }

    /// Feed one notification payload
    ///
    /// Returns the new state if the payload was a flow-control signal.
    pub fn observe(&self, payload: &[u8]) -> Option<FlowState> {
        if payload.len() != MATCH_LEN {
            trace!("Ignoring {}-byte notification", payload.len());
            return None;
        }

        let next = if payload == &PAUSE[..MATCH_LEN] {
            FlowState::Paused
        } else if payload == &RESUME[..MATCH_LEN] {
            FlowState::Running
        } else {
            trace!("Ignoring notification {}", hex::encode(payload));
            return None;
        };

        debug!("Flow control: {:?}", next);
        self.state.send_replace(next);
        Some(next)
    }

    /// Clear any pause left over from a previous connection
    pub fn reset(&self) {
        self.state.send_replace(FlowState::Running);
    }

    /// Wait until the printer accepts data
    ///
    /// Returns immediately when not paused.
    pub async fn wait_ready(&self) {
        let mut rx = self.state.subscribe();
        if *rx.borrow() == FlowState::Paused {
            debug!("Printer paused the transfer, waiting for resume");
        }
        // The sender lives as long as self, so this cannot fail
        let _ = rx.wait_for(|s| *s == FlowState::Running).await;
    }

    /// Drive the controller from a notification stream on a background task
    pub fn spawn_pump(&self, mut notifications: NotificationStream) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(payload) = notifications.next().await {
                controller.observe(&payload);
            }
            debug!("Notification stream ended");
        })
    }
}

impl Default for FlowController {
    fn default() -> Self {
        Self::new()
    }
}
