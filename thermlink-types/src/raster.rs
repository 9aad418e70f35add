//! 1-bit-per-pixel scanline buffer
//!
//! Rows are packed MSB first, `ceil(width / 8)` bytes per row, top to bottom.
//! This is the shape the bitmap layer hands to the printer; drawing itself
//! happens elsewhere.

use crate::error::{Error, Result};

/// Packed monochrome image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Blank raster
    pub fn new(width: u32, height: u32) -> Self {
        let pitch = Self::pitch_for(width);
        Self {
            width,
            height,
            data: vec![0; pitch * height as usize],
        }
    }

    /// Wrap already packed rows
    ///
    /// # Errors
    ///
    /// Fails if `data` is not a whole number of rows.
    pub fn from_bytes(width: u32, data: Vec<u8>) -> Result<Self> {
        let pitch = Self::pitch_for(width);
        if pitch == 0 {
            return Err(Error::Validation("raster width must be non-zero".into()));
        }
        if data.len() % pitch != 0 {
            return Err(Error::Validation(format!(
                "{} bytes is not a multiple of the {}-byte row pitch",
                data.len(),
                pitch
            )));
        }

        Ok(Self {
            width,
            height: (data.len() / pitch) as u32,
            data,
        })
    }

    fn pitch_for(width: u32) -> usize {
        width.div_ceil(8) as usize
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn pitch(&self) -> usize {
        Self::pitch_for(self.width)
    }

    /// Set every byte to `pattern` (0x00 blank, 0xFF black)
    pub fn fill(&mut self, pattern: u8) {
        self.data.fill(pattern);
    }

    /// Set or clear one pixel
    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }

        let idx = y as usize * self.pitch() + (x / 8) as usize;
        let mask = 0x80 >> (x % 8);
        if on {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
        Ok(())
    }

    /// One row, if in range
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let pitch = self.pitch();
        let start = y as usize * pitch;
        Some(&self.data[start..start + pitch])
    }

    /// All rows, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.pitch().max(1))
    }

    /// Raw packed bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_is_blank() {
        let raster = Raster::new(384, 3);

        assert_eq!(raster.pitch(), 48);
        assert_eq!(raster.height(), 3);
        assert_eq!(raster.rows().count(), 3);
        assert!(raster.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pitch_rounds_up() {
        assert_eq!(Raster::new(9, 1).pitch(), 2);
        assert_eq!(Raster::new(8, 1).pitch(), 1);
    }

    #[test]
    fn test_set_pixel_msb_first() {
        let mut raster = Raster::new(16, 2);
        raster.set_pixel(0, 0, true).unwrap();
        raster.set_pixel(9, 1, true).unwrap();

        assert_eq!(raster.row(0).unwrap(), &[0x80, 0x00]);
        assert_eq!(raster.row(1).unwrap(), &[0x00, 0x40]);

        raster.set_pixel(0, 0, false).unwrap();
        assert_eq!(raster.row(0).unwrap(), &[0x00, 0x00]);
    }

    #[test]
    fn test_set_pixel_out_of_bounds() {
        let mut raster = Raster::new(8, 1);
        assert!(matches!(
            raster.set_pixel(8, 0, true),
            Err(Error::OutOfBounds { x: 8, .. })
        ));
        assert!(raster.set_pixel(0, 1, true).is_err());
    }

    #[test]
    fn test_from_bytes() {
        let raster = Raster::from_bytes(16, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(raster.height(), 3);
        assert_eq!(raster.row(2).unwrap(), &[5, 6]);
        assert_eq!(raster.row(3), None);

        assert!(Raster::from_bytes(16, vec![1, 2, 3]).is_err());
        assert!(Raster::from_bytes(0, vec![]).is_err());
    }

    #[test]
    fn test_fill() {
        let mut raster = Raster::new(16, 2);
        raster.fill(0xFF);
        assert!(raster.rows().all(|row| row == [0xFF, 0xFF]));
    }
}
