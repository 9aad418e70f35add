//! Command scripts
//!
//! The firmware expects fixed command sequences with fixed gaps between
//! them. Scripts are built here as plain data ([`Step`]s) and executed by
//! whoever owns the radio link, so the ordering can be tested without one.

use std::fmt;
use std::time::Duration;

use crate::{
    command::Opcode,
    constants::{defaults, lattice, timing},
    error::{Error, Result},
    frame::Frame,
    mirror,
};

/// Device settings applied by the init and post-print sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintSettings {
    /// DPI selector (0x36 = 200 DPI)
    pub dpi: u8,

    /// Speed used while printing
    pub speed: u8,

    /// Speed used while feeding after an image
    pub feed_speed: u8,

    /// Heating energy
    pub energy: u16,

    /// Lines fed after every image
    pub feed_lines: u16,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            dpi: defaults::DPI,
            speed: defaults::SPEED,
            feed_speed: defaults::FEED_SPEED,
            energy: defaults::ENERGY,
            feed_lines: defaults::FEED_LINES,
        }
    }
}

/// One scripted action: an optional frame followed by a pause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Short name for logging
    pub name: &'static str,

    /// Frame to send, `None` for a pure wait
    pub frame: Option<Frame>,

    /// Time to wait after sending
    pub delay: Duration,
}

impl Step {
    fn send(name: &'static str, frame: Frame, delay: Duration) -> Self {
        Self {
            name,
            frame: Some(frame),
            delay,
        }
    }

    fn wait(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            frame: None,
            delay,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.frame {
            Some(frame) => write!(f, "{} {} (+{:?})", self.name, frame, self.delay),
            None => write!(f, "{} (+{:?})", self.name, self.delay),
        }
    }
}

fn lattice_start() -> Frame {
    Frame::from_static(Opcode::Lattice, &lattice::START)
}

fn lattice_end() -> Frame {
    Frame::from_static(Opcode::Lattice, &lattice::END)
}

/// Sequence sent once per connection before the first image
///
/// Nine steps: state query, start printing, DPI, speed, energy, apply
/// energy, update device, flush, lattice start.
pub fn init_sequence(settings: &PrintSettings) -> Vec<Step> {
    vec![
        Step::send(
            "get_device_state",
            Frame::d8(Opcode::DeviceState, 0x00),
            timing::AFTER_STATE_QUERY,
        ),
        Step::send(
            "start_printing",
            Frame::d8(Opcode::DeviceState, 0x01),
            timing::AFTER_COMMAND,
        ),
        Step::send(
            "set_dpi",
            Frame::d8(Opcode::SetDpi, settings.dpi),
            timing::AFTER_COMMAND,
        ),
        Step::send(
            "set_speed",
            Frame::d8(Opcode::SetSpeed, settings.speed),
            timing::AFTER_COMMAND,
        ),
        Step::send(
            "set_energy",
            Frame::d16(Opcode::SetEnergy, settings.energy),
            timing::AFTER_COMMAND,
        ),
        Step::send(
            "apply_energy",
            Frame::d8(Opcode::DrawingMode, 0x00),
            timing::AFTER_COMMAND,
        ),
        Step::send(
            "update_device",
            Frame::d8(Opcode::UpdateDevice, 0x00),
            timing::AFTER_COMMAND,
        ),
        Step::wait("flush", timing::FLUSH),
        Step::send(
            "lattice_start",
            lattice_start(),
            timing::AFTER_LATTICE * 2,
        ),
    ]
}

/// Steps opening an image transfer
pub fn image_prologue() -> Vec<Step> {
    vec![
        Step::send(
            "drawing_mode",
            Frame::d8(Opcode::DrawingMode, 0x00),
            Duration::ZERO,
        ),
        Step::send("lattice_start", lattice_start(), timing::AFTER_LATTICE),
    ]
}

/// One image row, bit-mirrored and framed
///
/// `row` must be exactly `ceil(width / 8)` bytes.
pub fn image_row(row: &[u8], width: u32) -> Result<Step> {
    let expected = width.div_ceil(8) as usize;
    if row.len() != expected {
        return Err(Error::ScanlineLength {
            expected,
            actual: row.len(),
        });
    }

    let frame = Frame::multi(Opcode::PrintRow, mirror::mirror_row(row))?;
    Ok(Step::send("print_row", frame, timing::AFTER_ROW))
}

/// Steps closing an image transfer and moving the paper out
pub fn image_epilogue(settings: &PrintSettings) -> Vec<Step> {
    vec![
        Step::send("lattice_end", lattice_end(), timing::AFTER_LATTICE),
        Step::send(
            "set_speed",
            Frame::d8(Opcode::SetSpeed, settings.feed_speed),
            Duration::ZERO,
        ),
        Step::send(
            "feed",
            Frame::d16(Opcode::FeedPaper, settings.feed_lines),
            Duration::ZERO,
        ),
        Step::send(
            "get_device_state",
            Frame::d8(Opcode::DeviceState, 0x00),
            Duration::ZERO,
        ),
        Step::wait("flush", timing::FLUSH),
    ]
}

fn paper_move(opcode: Opcode, lines: u16) -> Result<Frame> {
    if lines > 255 {
        return Err(Error::LineCountOutOfRange(lines));
    }
    Ok(Frame::d16(opcode, lines))
}

/// Feed blank paper by `lines` scanlines (0..=255)
pub fn feed(lines: u16) -> Result<Frame> {
    paper_move(Opcode::FeedPaper, lines)
}

/// Pull paper back by `lines` scanlines (0..=255)
pub fn retract(lines: u16) -> Result<Frame> {
    paper_move(Opcode::RetractPaper, lines)
}

/// Change heating energy
pub fn set_energy(level: u16) -> Frame {
    Frame::d16(Opcode::SetEnergy, level)
}
