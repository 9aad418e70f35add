//! Paper feed and energy control

use std::time::Duration;

use anyhow::Context;
use thermlink::{Printer, PrinterConfig};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut printer = Printer::open(PrinterConfig::from_env()).await?;
    let info = printer
        .scan_and_connect()
        .await
        .context("no printer to talk to")?;
    println!("Connected: {}", info);

    println!("Feeding 100 lines...");
    printer.feed(100).await?;
    sleep(Duration::from_secs(1)).await;

    println!("Retracting 40 lines...");
    printer.retract(40).await?;
    sleep(Duration::from_secs(1)).await;

    println!("Lowering energy");
    printer.set_energy(0x4000).await?;

    if printer.is_connected().await {
        println!("Still connected to {}", printer.name().unwrap_or_default());
    }

    printer.disconnect().await?;
    println!("Disconnected");
    Ok(())
}
