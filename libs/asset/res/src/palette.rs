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
use crate::reader::ChunkReader;
use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};

/// A PlayStation 15 bit color with a 1 bit semi-transparency flag.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Rgba5551 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba5551 {
    const CHANNEL_BITS: u32 = 5;
    const CHANNEL_MASK: u16 = (1 << Self::CHANNEL_BITS) - 1;
    const G_SHIFT: u32 = 5;
    const B_SHIFT: u32 = 10;
    const A_SHIFT: u32 = 15;

    pub fn from_word(v: u16) -> Self {
        Self {
            r: (v & Self::CHANNEL_MASK) as u8,
            g: ((v >> Self::G_SHIFT) & Self::CHANNEL_MASK) as u8,
            b: ((v >> Self::B_SHIFT) & Self::CHANNEL_MASK) as u8,
            a: ((v >> Self::A_SHIFT) & 1) as u8,
        }
    }

    pub fn to_word(self) -> u16 {
        (u16::from(self.r) & Self::CHANNEL_MASK)
            | (u16::from(self.g) & Self::CHANNEL_MASK) << Self::G_SHIFT
            | (u16::from(self.b) & Self::CHANNEL_MASK) << Self::B_SHIFT
            | (u16::from(self.a) & 1) << Self::A_SHIFT
    }
}

const PALETTE_COUNT: usize = 16;
const COLORS_PER_PALETTE: usize = 16;

pub type Palette = [Rgba5551; COLORS_PER_PALETTE];

/// Sixteen palettes of sixteen colors. The color palettes (0x11), the
/// grayscale palettes (0x1F) and the palette animation colors (0x1C) all
/// share this shape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaletteChunk {
    pub palettes: [Palette; PALETTE_COUNT],
    pub footer: Vec<u8>,
}

impl PaletteChunk {
    pub const PALETTE_COUNT: usize = PALETTE_COUNT;
    pub const COLORS_PER_PALETTE: usize = COLORS_PER_PALETTE;
    pub const BYTE_SIZE: usize = Self::PALETTE_COUNT * Self::COLORS_PER_PALETTE * 2;

    pub fn from_bytes(index: usize, data: &[u8]) -> Result<Self> {
        let mut reader = ChunkReader::new(index, data);
        reader.require(Self::BYTE_SIZE)?;
        let mut palettes = [[Rgba5551::default(); Self::COLORS_PER_PALETTE]; Self::PALETTE_COUNT];
        for palette in palettes.iter_mut() {
            for color in palette.iter_mut() {
                *color = Rgba5551::from_word(reader.u16()?);
            }
        }
        Ok(Self {
            palettes,
            footer: reader.rest().to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::BYTE_SIZE + self.footer.len());
        for palette in &self.palettes {
            for color in palette {
                out.write_u16::<LittleEndian>(color.to_word())?;
            }
        }
        out.extend_from_slice(&self.footer);
        Ok(out)
    }

    pub fn palette(&self, i: usize) -> Option<&Palette> {
        self.palettes.get(i)
    }
}
