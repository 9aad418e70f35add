//! In-memory printer link for facade tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::{stream, StreamExt};
use thermlink::{DeviceHandle, Frame, Link};
use thermlink_core::constants::flow;
use thermlink_transport::{
    AdvertisementStream, CharProps, CharacteristicInfo, ConnectionParams, NotificationStream,
    Result, ServiceInfo, Uuid, WriteMode, NOTIFY_CHAR_UUID, SERVICE_UUID, WRITE_CHAR_UUID,
};

/// Shared view of what the fake printer saw
#[derive(Clone)]
pub struct FakeHandle {
    pub connect_calls: Arc<AtomicUsize>,
    pub link_up: Arc<AtomicBool>,
    pub fail_writes: Arc<AtomicBool>,
    /// The printer pauses right after accepting the next chunk
    pub pause_after_write: Arc<AtomicBool>,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    notify: mpsc::UnboundedSender<Vec<u8>>,
}

impl FakeHandle {
    /// Every chunk written so far
    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    /// Written bytes re-assembled into frames
    pub fn frames(&self) -> Vec<Frame> {
        let bytes: Vec<u8> = self.chunks().concat();
        let mut frames = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let len = u16::from_le_bytes([bytes[pos + 4], bytes[pos + 5]]) as usize;
            let end = pos + len + 8;
            frames.push(Frame::decode(&bytes[pos..end]).expect("host wrote a valid frame"));
            pos = end;
        }
        frames
    }

    pub fn clear(&self) {
        self.writes.lock().unwrap().clear();
    }

    /// Push a notification from the printer
    pub fn notify(&self, payload: &[u8]) {
        self.notify.unbounded_send(payload.to_vec()).unwrap();
    }
}

pub struct FakeLink {
    adverts: Vec<DeviceHandle>,
    connect_failures: usize,
    handle: FakeHandle,
    notifications: Option<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl FakeLink {
    /// A fake radio advertising `names`, whose first `connect_failures`
    /// connects report failure
    pub fn new(names: &[&str], connect_failures: usize) -> (Self, FakeHandle) {
        let (tx, rx) = mpsc::unbounded();
        let handle = FakeHandle {
            connect_calls: Arc::new(AtomicUsize::new(0)),
            link_up: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            pause_after_write: Arc::new(AtomicBool::new(false)),
            writes: Arc::new(Mutex::new(Vec::new())),
            notify: tx,
        };
        let adverts = names
            .iter()
            .enumerate()
            .map(|(i, name)| DeviceHandle::new(format!("dev-{}", i), *name))
            .collect();

        let link = Self {
            adverts,
            connect_failures,
            handle: handle.clone(),
            notifications: Some(rx),
        };
        (link, handle)
    }
}

#[async_trait]
impl Link for FakeLink {
    async fn start_scan(&mut self) -> Result<AdvertisementStream> {
        // Advertise, then stay silent like a real radio
        let adverts = stream::iter(self.adverts.clone()).chain(stream::pending());
        Ok(Box::pin(adverts))
    }

    async fn stop_scan(&mut self) -> Result<()> {
        Ok(())
    }

    async fn connect(&mut self, _: &DeviceHandle, _: &ConnectionParams) -> Result<bool> {
        let call = self.handle.connect_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.connect_failures {
            return Ok(false);
        }
        self.handle.link_up.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn is_connected(&self) -> Result<bool> {
        Ok(self.handle.link_up.load(Ordering::SeqCst))
    }

    async fn mtu(&self) -> Result<Option<u16>> {
        Ok(Some(247))
    }

    async fn services(&mut self) -> Result<Vec<ServiceInfo>> {
        Ok(vec![ServiceInfo {
            uuid: SERVICE_UUID,
            characteristics: vec![
                CharacteristicInfo {
                    uuid: WRITE_CHAR_UUID,
                    properties: CharProps::WRITE_WITHOUT_RESPONSE,
                },
                CharacteristicInfo {
                    uuid: NOTIFY_CHAR_UUID,
                    properties: CharProps::NOTIFY,
                },
            ],
        }])
    }

    async fn write(&mut self, _: Uuid, data: &[u8], _: WriteMode) -> Result<()> {
        if self.handle.fail_writes.load(Ordering::SeqCst) {
            return Err(thermlink_transport::Error::DeviceGone("dev-0".into()));
        }
        self.handle.writes.lock().unwrap().push(data.to_vec());
        if self.handle.pause_after_write.swap(false, Ordering::SeqCst) {
            self.handle.notify(&flow::PAUSE[..8]);
            // Give the pump a turn before the next chunk
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        Ok(())
    }

    async fn subscribe(&mut self, _: Uuid) -> Result<NotificationStream> {
        match self.notifications.take() {
            Some(rx) => Ok(Box::pin(rx)),
            None => Ok(Box::pin(stream::pending::<Vec<u8>>())),
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.handle.link_up.store(false, Ordering::SeqCst);
        Ok(())
    }
}
