//! # thermlink-core
//!
//! Core protocol implementation for 0x51 0x78 BLE thermal printers.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame structure and encoding/decoding
//! - CRC8 checksum and scanline bit mirroring
//! - Opcode definitions and protocol constants
//! - Command scripts (init, image bracket, paper movement)
//! - Session state machine

pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod frame;
pub mod mirror;
pub mod script;
pub mod session;

pub use command::Opcode;
pub use error::{Error, Result};
pub use frame::Frame;
pub use script::{PrintSettings, Step};
pub use session::{Session, SessionState};
