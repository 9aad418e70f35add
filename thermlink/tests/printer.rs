mod common;

use std::time::Duration;

use common::FakeLink;
use pretty_assertions::assert_eq;
use thermlink::{Error, Opcode, Printer, PrinterConfig, Raster, SessionState};
use thermlink_core::constants::{flow, lattice};

fn opcodes(frames: &[thermlink::Frame]) -> Vec<Opcode> {
    frames.iter().map(|f| f.opcode()).collect()
}

async fn connected(names: &[&str]) -> (Printer<FakeLink>, common::FakeHandle) {
    let (link, handle) = FakeLink::new(names, 0);
    let mut printer = Printer::new(link, PrinterConfig::default());
    printer.scan_and_connect().await.unwrap();
    (printer, handle)
}

#[tokio::test(start_paused = true)]
async fn test_scan_connect_print() {
    let (link, handle) = FakeLink::new(&["Headphones", "X18-9556"], 0);
    let mut printer = Printer::new(link, PrinterConfig::default());

    let device = printer.scan().await.unwrap();
    assert_eq!(device.name, "X18-9556");
    assert_eq!(printer.remembered_name(), Some("X18-9556"));
    assert_eq!(printer.state(), SessionState::Connecting);

    let info = printer.connect().await.unwrap();
    assert_eq!(info.width, 384);
    assert_eq!(printer.state(), SessionState::Uninitialized);
    assert_eq!(printer.name().as_deref(), Some("X18-9556"));
    assert_eq!(printer.width(), 384);

    printer.print_rows([&[0xF0u8; 48][..]]).await.unwrap();
    assert_eq!(printer.state(), SessionState::Ready);

    let frames = handle.frames();
    assert_eq!(
        opcodes(&frames),
        vec![
            // init
            Opcode::DeviceState,
            Opcode::DeviceState,
            Opcode::SetDpi,
            Opcode::SetSpeed,
            Opcode::SetEnergy,
            Opcode::DrawingMode,
            Opcode::UpdateDevice,
            Opcode::Lattice,
            // image
            Opcode::DrawingMode,
            Opcode::Lattice,
            Opcode::PrintRow,
            Opcode::Lattice,
            Opcode::SetSpeed,
            Opcode::FeedPaper,
            Opcode::DeviceState,
        ]
    );

    assert_eq!(&frames[9].payload()[..], &lattice::START[..]);
    assert_eq!(frames[10].payload().len(), 48);
    assert!(frames[10].payload().iter().all(|&b| b == 0x0F));
    assert_eq!(&frames[11].payload()[..], &lattice::END[..]);
    assert_eq!(&frames[13].payload()[..], &[0x80u8, 0x00]);
}

#[tokio::test(start_paused = true)]
async fn test_init_sent_once_per_connection() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;

    printer.print_rows([&[0u8; 48][..]]).await.unwrap();
    handle.clear();

    printer.print_rows([&[0u8; 48][..], &[0u8; 48][..]]).await.unwrap();
    let frames = handle.frames();
    assert_eq!(frames[0].opcode(), Opcode::DrawingMode);
    assert_eq!(frames.len(), 2 + 2 + 4);
}

#[tokio::test(start_paused = true)]
async fn test_print_raster() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;

    let mut raster = Raster::new(384, 3);
    raster.set_pixel(0, 1, true).unwrap();
    printer.print(&raster).await.unwrap();

    let rows: Vec<_> = handle
        .frames()
        .into_iter()
        .filter(|f| f.opcode() == Opcode::PrintRow)
        .collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].payload()[0], 0x01, "leftmost pixel is mirrored into bit 0");
}

#[tokio::test(start_paused = true)]
async fn test_bad_scanline_sends_nothing() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;

    let err = printer
        .print_rows([&[0u8; 48][..], &[0u8; 47][..]])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Core(thermlink_core::Error::ScanlineLength {
            expected: 48,
            actual: 47
        })
    ));
    assert!(handle.chunks().is_empty());
    assert_eq!(printer.state(), SessionState::Uninitialized);
}

#[tokio::test(start_paused = true)]
async fn test_scan_not_found() {
    let (link, _handle) = FakeLink::new(&["Headphones", "X18-9556-B"], 0);
    let mut printer = Printer::new(link, PrinterConfig::default());

    let err = printer.scan().await.unwrap_err();

    assert!(matches!(err, Error::NotFound { timeout_secs: 5, .. }));
    assert!(err.is_recoverable());
    assert_eq!(printer.state(), SessionState::Idle);
    assert!(matches!(
        printer.connect().await,
        Err(Error::NoPrinterSelected)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_scan_by_prefix() {
    let (link, _handle) = FakeLink::new(&["GB01", "MX10"], 0);
    let mut printer = Printer::new(link, PrinterConfig::default().with_name("MX"));

    let device = printer.scan().await.unwrap();

    assert_eq!(device.name, "MX10");
    assert_eq!(printer.remembered_name(), None);
}

#[tokio::test(start_paused = true)]
async fn test_connect_retries() {
    let (link, handle) = FakeLink::new(&["X18-9556"], 2);
    let mut printer = Printer::new(link, PrinterConfig::default());

    printer.scan_and_connect().await.unwrap();

    assert_eq!(handle.connect_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert_eq!(printer.state(), SessionState::Uninitialized);
}

#[tokio::test(start_paused = true)]
async fn test_connect_unreachable() {
    let (link, handle) = FakeLink::new(&["X18-9556"], 10);
    let mut printer = Printer::new(link, PrinterConfig::default());

    let err = printer.scan_and_connect().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(thermlink_transport::Error::Unreachable { attempts: 3 })
    ));
    assert_eq!(handle.connect_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert_eq!(printer.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_requires_connection() {
    let (link, _handle) = FakeLink::new(&[], 0);
    let mut printer = Printer::new(link, PrinterConfig::default());

    assert!(matches!(
        printer.print_rows([&[0u8; 48][..]]).await,
        Err(Error::NotConnected)
    ));
    assert!(matches!(printer.feed(10).await, Err(Error::NotConnected)));
    assert_eq!(printer.width(), 0);
    assert_eq!(printer.name(), None);
    assert!(!printer.is_connected().await);
}

#[tokio::test(start_paused = true)]
async fn test_paper_commands() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;

    printer.feed(100).await.unwrap();
    printer.retract(40).await.unwrap();
    printer.set_energy(0x4000).await.unwrap();

    let frames = handle.frames();
    assert_eq!(
        opcodes(&frames),
        vec![Opcode::FeedPaper, Opcode::RetractPaper, Opcode::SetEnergy]
    );
    assert_eq!(&frames[0].payload()[..], &[100u8, 0]);
    assert_eq!(&frames[2].payload()[..], &[0x00u8, 0x40]);
    assert_eq!(printer.config().settings.energy, 0x4000);

    assert!(matches!(
        printer.feed(256).await,
        Err(Error::Core(thermlink_core::Error::LineCountOutOfRange(256)))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_write_raw_is_chunked() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;

    printer.write_raw(&[0x55; 450]).await.unwrap();

    let sizes: Vec<usize> = handle.chunks().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![200, 200, 50]);
}

#[tokio::test(start_paused = true)]
async fn test_pause_holds_commands() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;

    handle.notify(&flow::PAUSE[..8]);
    tokio::time::sleep(Duration::from_millis(1)).await;

    let stalled = tokio::time::timeout(Duration::from_secs(60), printer.feed(10)).await;
    assert!(stalled.is_err());
    assert!(handle.chunks().is_empty());

    handle.notify(&flow::RESUME[..8]);
    tokio::time::sleep(Duration::from_millis(1)).await;

    printer.feed(10).await.unwrap();
    assert_eq!(handle.frames().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pause_mid_write_resumes_in_order() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;
    handle
        .pause_after_write
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let data: Vec<u8> = (0..450u32).map(|i| (i % 256) as u8).collect();
    let printer_side = async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(handle.chunks().len(), 1, "nothing goes out while paused");
        handle.notify(&flow::RESUME[..8]);
    };

    let (written, ()) = tokio::join!(printer.write_raw(&data), printer_side);
    written.unwrap();

    let chunks = handle.chunks();
    let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![200, 200, 50]);
    assert_eq!(chunks.concat(), data);
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_disconnects() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;
    handle
        .fail_writes
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let err = printer.print_rows([&[0u8; 48][..]]).await.unwrap_err();

    assert!(err.requires_reconnect());
    assert_eq!(printer.state(), SessionState::Disconnected);
    assert_eq!(printer.width(), 0);
    assert!(printer.info().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_link_detected() {
    let (mut printer, handle) = connected(&["X18-9556"]).await;
    assert!(printer.is_connected().await);

    handle
        .link_up
        .store(false, std::sync::atomic::Ordering::SeqCst);

    assert!(!printer.is_connected().await);
    assert_eq!(printer.state(), SessionState::Disconnected);

    // A fresh cycle starts with a new scan and re-sends init
    handle.clear();
    printer.scan_and_connect().await.unwrap();
    printer.print_rows([&[0u8; 48][..]]).await.unwrap();
    assert_eq!(handle.frames().len(), 8 + 2 + 1 + 4);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_is_idempotent() {
    let (mut printer, _handle) = connected(&["X18-9556"]).await;

    printer.disconnect().await.unwrap();
    printer.disconnect().await.unwrap();

    assert_eq!(printer.state(), SessionState::Disconnected);
    assert!(!printer.is_connected().await);
}
