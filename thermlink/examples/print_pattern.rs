//! Print a test pattern
//!
//! Set `THERMLINK_PRINTER` to a name prefix to pick a specific printer,
//! `RUST_LOG=thermlink=debug` for per-command logging.

use thermlink::{Printer, PrinterConfig, Raster};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> thermlink::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = PrinterConfig::from_env();
    println!("Looking for {}...", config.identity);

    let mut printer = Printer::open(config).await?;
    let device = printer.scan().await?;
    println!("Found {}", device);

    let info = printer.connect().await?;
    println!("Connected: {}", info);

    // Checkerboard of 8x8 squares, then a solid bar
    let width = printer.width();
    let mut raster = Raster::new(width, 96);
    for y in 0..64 {
        for x in 0..width {
            raster.set_pixel(x, y, (x / 8 + y / 8) % 2 == 0)?;
        }
    }
    for y in 64..96 {
        for x in 0..width {
            raster.set_pixel(x, y, true)?;
        }
    }

    printer.print(&raster).await?;
    println!("Printed {} rows", raster.height());

    printer.disconnect().await?;
    Ok(())
}
