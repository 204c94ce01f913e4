// This file is part of fft-map.
//
// fft-map is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// fft-map is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with fft-map.  If not, see <http://www.gnu.org/licenses/>.

// Map textures are a single fixed size page of 4 bit palette indices. There is
// no header: two pixels are packed per byte, low nibble first, rows top to
// bottom. The indices select a color out of one of the 16 palettes carried in
// the map's palette chunk; which palette is picked per face, not per texture.
use anyhow::Result;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum TexError {
    #[error("expected a texture of {expected} bytes, found {actual}")]
    UnexpectedTextureSize { expected: usize, actual: usize },
}

/// One packed byte of texture data: two 4 bit indices.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TwoNibbles {
    pub lo: u8,
    pub hi: u8,
}

impl TwoNibbles {
    const MASK: u8 = 0x0F;
    const HI_SHIFT: u32 = 4;

    pub fn from_byte(b: u8) -> Self {
        Self {
            lo: b & Self::MASK,
            hi: (b >> Self::HI_SHIFT) & Self::MASK,
        }
    }

    // Out of range indices are truncated to their low 4 bits.
    pub fn to_byte(self) -> u8 {
        (self.lo & Self::MASK) | ((self.hi & Self::MASK) << Self::HI_SHIFT)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Texture {
    pixels: Vec<u8>,
}

impl Texture {
    pub const WIDTH: usize = 256;
    pub const HEIGHT: usize = 1024;
    pub const ROW_SIZE: usize = Self::WIDTH >> 1;
    pub const BYTE_SIZE: usize = Self::ROW_SIZE * Self::HEIGHT;

    /// A texture with every pixel set to index 0.
    pub fn empty() -> Self {
        Self {
            pixels: vec![0u8; Self::WIDTH * Self::HEIGHT],
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != Self::BYTE_SIZE {
            return Err(TexError::UnexpectedTextureSize {
                expected: Self::BYTE_SIZE,
                actual: data.len(),
            }
            .into());
        }
        let mut pixels = Vec::with_capacity(Self::WIDTH * Self::HEIGHT);
        for &b in data {
            let pair = TwoNibbles::from_byte(b);
            pixels.push(pair.lo);
            pixels.push(pair.hi);
        }
        Ok(Self { pixels })
    }

    /// Build from one palette index per pixel, row major.
    pub fn from_indices(pixels: Vec<u8>) -> Result<Self> {
        let expected = Self::WIDTH * Self::HEIGHT;
        if pixels.len() != expected {
            return Err(TexError::UnexpectedTextureSize {
                expected,
                actual: pixels.len(),
            }
            .into());
        }
        Ok(Self { pixels })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(2)
            .map(|pair| {
                TwoNibbles {
                    lo: pair[0],
                    hi: pair[1],
                }
                .to_byte()
            })
            .collect()
    }

    pub fn width(&self) -> usize {
        Self::WIDTH
    }

    pub fn height(&self) -> usize {
        Self::HEIGHT
    }

    /// Flat, row major palette indices. Values are in [0,15] unless set
    /// out of range through `index_at_mut`; those are truncated on write.
    pub fn indices(&self) -> &[u8] {
        &self.pixels
    }

    fn offset(x: usize, y: usize) -> Option<usize> {
        if x < Self::WIDTH && y < Self::HEIGHT {
            Some(y * Self::WIDTH + x)
        } else {
            None
        }
    }

    /// The palette index at `(x, y)`, or None outside the texture.
    #[inline]
    pub fn index_at(&self, x: usize, y: usize) -> Option<u8> {
        Self::offset(x, y).map(|i| self.pixels[i])
    }

    #[inline]
    pub fn index_at_mut(&mut self, x: usize, y: usize) -> Option<&mut u8> {
        Self::offset(x, y).map(move |i| &mut self.pixels[i])
    }

    /// Count of pixels using each of the 16 indices.
    pub fn histogram(&self) -> [usize; 16] {
        let mut out = [0usize; 16];
        for &p in &self.pixels {
            out[(p & 0x0F) as usize] += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_expands_low_nibble_first() -> Result<()> {
        let mut data = vec![0u8; Texture::BYTE_SIZE];
        data[0] = 0x21;
        data[Texture::ROW_SIZE] = 0xF0;
        let tex = Texture::from_bytes(&data)?;
        assert_eq!(tex.indices().len(), 262_144);
        assert_eq!(tex.index_at(0, 0), Some(1));
        assert_eq!(tex.index_at(1, 0), Some(2));
        assert_eq!(tex.index_at(0, 1), Some(0));
        assert_eq!(tex.index_at(1, 1), Some(15));
        Ok(())
    }

    #[test]
    fn it_has_no_pixels_outside_the_texture() {
        let mut tex = Texture::empty();
        assert_eq!(tex.index_at(Texture::WIDTH - 1, Texture::HEIGHT - 1), Some(0));
        assert_eq!(tex.index_at(Texture::WIDTH, 0), None);
        assert_eq!(tex.index_at(0, Texture::HEIGHT), None);
        assert!(tex.index_at_mut(Texture::WIDTH, 3).is_none());
    }

    #[test]
    fn it_repacks_what_it_read() -> Result<()> {
        let data = (0..Texture::BYTE_SIZE)
            .map(|i| (i * 7 % 256) as u8)
            .collect::<Vec<u8>>();
        let tex = Texture::from_bytes(&data)?;
        assert_eq!(tex.to_bytes(), data);
        Ok(())
    }

    #[test]
    fn it_truncates_wide_indices_on_write() -> Result<()> {
        let mut tex = Texture::empty();
        *tex.index_at_mut(0, 0).unwrap() = 0x13;
        *tex.index_at_mut(1, 0).unwrap() = 0xF2;
        assert_eq!(tex.to_bytes()[0], 0x23);
        Ok(())
    }

    #[test]
    fn it_rejects_the_wrong_size() {
        let err = Texture::from_bytes(&[0u8; 100]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TexError>(),
            Some(&TexError::UnexpectedTextureSize {
                expected: 131_072,
                actual: 100
            })
        );
    }

    #[test]
    fn it_counts_indices() -> Result<()> {
        let mut tex = Texture::empty();
        *tex.index_at_mut(5, 5).unwrap() = 9;
        let hist = tex.histogram();
        assert_eq!(hist[9], 1);
        assert_eq!(hist[0], Texture::WIDTH * Texture::HEIGHT - 1);
        Ok(())
    }
}
