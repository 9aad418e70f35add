//! High-level printer interface

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use thermlink_core::{script, Frame, Session, SessionState, Step};
use thermlink_transport::{BleTransport, BtleplugLink, Link, WriteMode};
use thermlink_types::{DeviceHandle, PrinterInfo, Raster};

use crate::config::PrinterConfig;
use crate::error::{Error, Result};

/// A 0x51 0x78 thermal printer
///
/// Drives one scan, connect, print, disconnect cycle at a time. The init
/// sequence goes out automatically before the first image of every
/// connection.
///
/// # Examples
///
/// ```no_run
/// use thermlink::{Printer, PrinterConfig, Raster};
///
/// #[tokio::main]
/// async fn main() -> thermlink::Result<()> {
///     let mut printer = Printer::open(PrinterConfig::default()).await?;
///
///     printer.scan().await?;
///     let info = printer.connect().await?;
///     println!("Connected: {}", info);
///
///     let mut raster = Raster::new(384, 8);
///     raster.fill(0xFF);
///     printer.print(&raster).await?;
///
///     printer.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Printer<L: Link> {
    transport: BleTransport<L>,
    session: Session,
    config: PrinterConfig,

    /// Device found by the last scan
    device: Option<DeviceHandle>,

    /// Details of the current connection
    info: Option<PrinterInfo>,
}

impl Printer<BtleplugLink> {
    /// Create a printer on the host's first Bluetooth adapter
    pub async fn open(config: PrinterConfig) -> Result<Self> {
        let link = BtleplugLink::new().await?;
        Ok(Self::new(link, config))
    }
}

impl<L: Link> Printer<L> {
    /// Create a printer over an arbitrary link
    pub fn new(link: L, config: PrinterConfig) -> Self {
        Self {
            transport: BleTransport::with_config(link, config.transport.clone()),
            session: Session::new(),
            config,
            device: None,
            info: None,
        }
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Look for a printer matching the configured identity
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing matched before the scan timeout.
    pub async fn scan(&mut self) -> Result<DeviceHandle> {
        self.session.begin_scan()?;

        let identity = self.config.identity.clone();
        let timeout = self.config.transport.scan_timeout;

        let found = match self.transport.scan(&identity, timeout).await {
            Ok(found) => found,
            Err(e) => {
                self.session.finish_scan(None)?;
                return Err(e.into());
            }
        };

        self.session
            .finish_scan(found.as_ref().map(|d| d.name.clone()))?;

        match found {
            Some(device) => {
                self.device = Some(device.clone());
                Ok(device)
            }
            None => Err(Error::NotFound {
                identity: identity.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Connect to the printer found by [`Printer::scan`]
    pub async fn connect(&mut self) -> Result<PrinterInfo> {
        let device = match (self.session.state(), &self.device) {
            (SessionState::Connecting, Some(device)) => device.clone(),
            _ => return Err(Error::NoPrinterSelected),
        };

        match self.transport.connect(&device).await {
            Ok(info) => {
                self.session.connected()?;
                info!("Printer ready: {}", info);
                self.info = Some(info.clone());
                Ok(info)
            }
            Err(e) => {
                self.session.connect_failed()?;
                Err(e.into())
            }
        }
    }

    /// Scan and connect in one call
    pub async fn scan_and_connect(&mut self) -> Result<PrinterInfo> {
        self.scan().await?;
        self.connect().await
    }

    /// Print a whole raster
    ///
    /// The raster pitch must match the configured print width.
    pub async fn print(&mut self, raster: &Raster) -> Result<()> {
        debug!("Printing {}x{} raster", raster.width(), raster.height());
        self.print_rows(raster.rows()).await
    }

    /// Print scanlines, top to bottom
    ///
    /// Every row must be exactly `ceil(width / 8)` bytes, MSB first. All rows
    /// are checked before anything is sent.
    pub async fn print_rows<'a, I>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        self.ensure_connected()?;

        let width = self.config.width;
        let row_steps = rows
            .into_iter()
            .map(|row| script::image_row(row, width))
            .collect::<thermlink_core::Result<Vec<Step>>>()?;

        if !self.session.is_initialized() {
            info!("Initializing printer");
            let init = script::init_sequence(&self.config.settings);
            self.run(&init).await?;
            self.session.initialized()?;
        }

        self.session.begin_print()?;
        info!("Sending image ({} rows)", row_steps.len());

        let row_delay = self.config.row_delay;
        let epilogue = script::image_epilogue(&self.config.settings);

        self.run(&script::image_prologue()).await?;
        for step in &row_steps {
            self.execute(step, row_delay).await?;
        }
        self.run(&epilogue).await?;

        self.session.finish_print()?;
        debug!("Image sent");
        Ok(())
    }

    /// Feed blank paper (0..=255 lines)
    pub async fn feed(&mut self, lines: u16) -> Result<()> {
        self.ensure_connected()?;
        let frame = script::feed(lines)?;
        self.send_frame(&frame).await
    }

    /// Pull paper back (0..=255 lines)
    pub async fn retract(&mut self, lines: u16) -> Result<()> {
        self.ensure_connected()?;
        let frame = script::retract(lines)?;
        self.send_frame(&frame).await
    }

    /// Change heating energy for subsequent prints
    pub async fn set_energy(&mut self, level: u16) -> Result<()> {
        self.ensure_connected()?;
        self.send_frame(&script::set_energy(level)).await?;
        self.config.settings.energy = level;
        Ok(())
    }

    /// Write pre-encoded bytes, chunked and flow-controlled
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        trace!("Raw write of {} bytes", data.len());
        self.write(data).await
    }

    pub fn set_write_mode(&mut self, mode: WriteMode) {
        self.config.transport.write_mode = mode;
        self.transport.set_write_mode(mode);
    }

    /// Check the live link
    ///
    /// A link that dropped since the last call moves the session to
    /// [`SessionState::Disconnected`].
    pub async fn is_connected(&mut self) -> bool {
        if !self.session.is_connected() {
            return false;
        }

        let alive = match self.transport.check_link().await {
            Ok(alive) => alive,
            Err(e) => {
                warn!("Link check failed: {}", e);
                false
            }
        };

        if !alive {
            self.mark_lost().await;
        }
        alive
    }

    /// Name of the connected printer
    pub fn name(&self) -> Option<String> {
        if self.session.is_connected() {
            self.session.printer_name()
        } else {
            None
        }
    }

    /// Model name resolved by the last unqualified scan
    pub fn remembered_name(&self) -> Option<&str> {
        self.transport.remembered_name()
    }

    /// Print width in pixels, or 0 when not connected
    pub fn width(&self) -> u32 {
        if self.session.is_connected() {
            self.config.width
        } else {
            0
        }
    }

    /// Details of the current connection
    pub fn info(&self) -> Option<&PrinterInfo> {
        self.info.as_ref()
    }

    /// Close the link
    ///
    /// Safe to call in any state.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.info = None;
        self.device = None;
        let result = self.transport.disconnect().await;
        self.session.close();
        info!("Disconnected");
        result.map_err(Into::into)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.session.is_connected() && self.transport.is_connected() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    async fn run(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            self.execute(step, step.delay).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, step: &Step, delay: Duration) -> Result<()> {
        trace!("{}", step);
        if let Some(frame) = &step.frame {
            self.send_frame(frame).await?;
        }
        if self.config.pacing && !delay.is_zero() {
            sleep(delay).await;
        }
        Ok(())
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write(&frame.encode()).await
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if let Err(e) = self.transport.write_chunked(data).await {
            warn!("Write failed, dropping connection: {}", e);
            self.mark_lost().await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn mark_lost(&mut self) {
        self.info = None;
        if let Err(e) = self.transport.disconnect().await {
            debug!("Disconnect after link loss failed: {}", e);
        }
        self.session.close();
    }
}
