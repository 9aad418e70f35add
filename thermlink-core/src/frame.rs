//! Command frame structure and encoding/decoding

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use tracing::trace;

use crate::{
    checksum,
    command::Opcode,
    constants::{
        DIRECTION_DEVICE, DIRECTION_HOST, FRAME_OVERHEAD, MAX_PAYLOAD_SIZE, PREFIX, SUFFIX,
    },
    error::{Error, Result},
};

/// Printer command frame
///
/// # Frame Structure
///
/// ```text
/// ┌───────────┬────────┬───────────┬─────────────┬───────────┬──────────┬────────┐
/// │  Prefix   │ Opcode │ Direction │   Length    │  Payload  │  CRC8    │ Suffix │
/// │ 0x51 0x78 │ 1 byte │  1 byte   │ 2 bytes LE  │  N bytes  │ 1 byte   │  0xFF  │
/// └───────────┴────────┴───────────┴─────────────┴───────────┴──────────┴────────┘
/// ```
///
/// The checksum covers the payload only. Every constructor enforces
/// [`Frame::MAX_PAYLOAD_SIZE`], so an encoded frame never exceeds
/// [`MAX_FRAME_SIZE`](crate::constants::MAX_FRAME_SIZE).
///
/// # Examples
///
/// ```
/// use thermlink_core::{Frame, Opcode};
///
/// let frame = Frame::d8(Opcode::DeviceState, 0x01);
/// let encoded = frame.encode();
/// assert_eq!(encoded.len(), 9);
///
/// let decoded = Frame::decode(&encoded).unwrap();
/// assert_eq!(decoded, frame);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    opcode: Opcode,
    direction: u8,
    payload: Bytes,
}

impl Frame {
    /// Header size in bytes (prefix, opcode, direction, length)
    pub const HEADER_SIZE: usize = 6;

    /// Maximum payload size
    pub const MAX_PAYLOAD_SIZE: usize = MAX_PAYLOAD_SIZE;

    /// Frame over a constant payload
    pub(crate) fn from_static(opcode: Opcode, payload: &'static [u8]) -> Self {
        debug_assert!(payload.len() <= MAX_PAYLOAD_SIZE);
        Self {
            opcode,
            direction: DIRECTION_HOST,
            payload: Bytes::from_static(payload),
        }
    }

    /// Frame with a single data byte
    pub fn d8(opcode: Opcode, data: u8) -> Self {
        Self {
            opcode,
            direction: DIRECTION_HOST,
            payload: Bytes::copy_from_slice(&[data]),
        }
    }

    /// Frame with a 16-bit value, sent little-endian
    ///
    /// # Examples
    ///
    /// ```
    /// use thermlink_core::{Frame, Opcode};
    ///
    /// let frame = Frame::d16(Opcode::SetEnergy, 0x7FFF);
    /// assert_eq!(frame.payload(), &[0xFF, 0x7F]);
    /// ```
    pub fn d16(opcode: Opcode, data: u16) -> Self {
        Self {
            opcode,
            direction: DIRECTION_HOST,
            payload: Bytes::copy_from_slice(&data.to_le_bytes()),
        }
    }

    /// Frame with an arbitrary payload
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload exceeds
    /// [`Frame::MAX_PAYLOAD_SIZE`]. Callers split larger data themselves.
    pub fn multi(opcode: Opcode, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();

        if payload.len() > Self::MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                max: Self::MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            opcode,
            direction: DIRECTION_HOST,
            payload,
        })
    }

    /// Command opcode
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// 0x00 host to device, 0x01 device to host
    pub fn direction(&self) -> u8 {
        self.direction
    }

    /// Command data
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Calculate checksum for this frame
    pub fn checksum(&self) -> u8 {
        checksum::calculate(&self.payload)
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> BytesMut {
        debug_assert!(self.payload.len() <= MAX_PAYLOAD_SIZE);
        let mut buf = BytesMut::with_capacity(self.size());

        buf.put_slice(&PREFIX);
        buf.put_u8(self.opcode.into());
        buf.put_u8(self.direction);
        buf.put_u16_le(self.payload.len() as u16);
        buf.put_slice(&self.payload);
        buf.put_u8(self.checksum());
        buf.put_u8(SUFFIX);

        trace!("Encoded {}: {}", self, hex::encode(&buf));
        buf
    }

    /// Decode a frame from bytes
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Buffer is shorter than an empty frame
    /// - Prefix, suffix or length field are wrong
    /// - Payload is longer than [`Frame::MAX_PAYLOAD_SIZE`]
    /// - Checksum verification fails
    /// - Opcode is unknown, or a notification opcode claims the host direction
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < FRAME_OVERHEAD {
            return Err(Error::FrameTooShort {
                expected: FRAME_OVERHEAD,
                actual: buf.len(),
            });
        }

        if buf[..2] != PREFIX {
            return Err(Error::MalformedFrame(format!(
                "bad prefix {:02X?}",
                &buf[..2]
            )));
        }

        let len = LittleEndian::read_u16(&buf[4..6]) as usize;
        if len > Self::MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: len,
                max: Self::MAX_PAYLOAD_SIZE,
            });
        }

        if buf.len() != len + FRAME_OVERHEAD {
            return Err(Error::MalformedFrame(format!(
                "length field says {} payload bytes, frame has {}",
                len,
                buf.len() - FRAME_OVERHEAD
            )));
        }

        if buf[buf.len() - 1] != SUFFIX {
            return Err(Error::MalformedFrame(format!(
                "bad suffix 0x{:02X}",
                buf[buf.len() - 1]
            )));
        }

        let opcode = Opcode::try_from(buf[2])?;
        let direction = buf[3];
        match direction {
            DIRECTION_DEVICE => {}
            DIRECTION_HOST if !opcode.is_notification() => {}
            _ => {
                return Err(Error::MalformedFrame(format!(
                    "{} with direction 0x{:02X}",
                    opcode, direction
                )));
            }
        }
        let payload = Bytes::copy_from_slice(&buf[Self::HEADER_SIZE..Self::HEADER_SIZE + len]);
        let received = buf[Self::HEADER_SIZE + len];

        let frame = Self {
            opcode,
            direction,
            payload,
        };

        let expected = frame.checksum();
        if expected != received {
            return Err(Error::ChecksumMismatch { expected, received });
        }

        Ok(frame)
    }

    /// Get total encoded size
    pub fn size(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("opcode", &self.opcode)
            .field("direction", &format!("0x{:02X}", self.direction))
            .field("checksum", &format!("0x{:02X}", self.checksum()))
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[{}](len={})", self.opcode, self.payload.len())
    }
}
