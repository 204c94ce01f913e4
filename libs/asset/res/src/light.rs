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
use crate::{mesh::VertexPos, reader::ChunkReader};
use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};

/// Three directional light colors, stored channel-major: all three reds,
/// then all greens, then all blues. Only the low 11 bits of each word carry
/// the channel; the upper bits are kept as found.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LightColors {
    pub r: [u16; 3],
    pub g: [u16; 3],
    pub b: [u16; 3],
}

impl LightColors {
    pub const CHANNEL_BITS: u32 = 11;
    pub const CHANNEL_MASK: u16 = (1 << Self::CHANNEL_BITS) - 1;
    pub const BYTE_SIZE: usize = 18;

    fn read(reader: &mut ChunkReader) -> Result<Self> {
        let mut out = Self::default();
        for channel in [&mut out.r, &mut out.g, &mut out.b] {
            for v in channel.iter_mut() {
                *v = reader.u16()?;
            }
        }
        Ok(out)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        for channel in [&self.r, &self.g, &self.b] {
            for &v in channel {
                out.write_u16::<LittleEndian>(v)?;
            }
        }
        Ok(())
    }

    /// The masked fixed point channels of light `i`.
    pub fn channels(&self, i: usize) -> Option<[u16; 3]> {
        Some([
            self.r.get(i)? & Self::CHANNEL_MASK,
            self.g.get(i)? & Self::CHANNEL_MASK,
            self.b.get(i)? & Self::CHANNEL_MASK,
        ])
    }

    /// Light `i` with each channel scaled into [0,1].
    pub fn color(&self, i: usize) -> Option<[f32; 3]> {
        let scale = f32::from(Self::CHANNEL_MASK);
        let [r, g, b] = self.channels(i)?;
        Some([f32::from(r) / scale, f32::from(g) / scale, f32::from(b) / scale])
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Rgb888 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb888 {
    pub const BYTE_SIZE: usize = 3;

    fn read(reader: &mut ChunkReader) -> Result<Self> {
        Ok(Self {
            r: reader.u8()?,
            g: reader.u8()?,
            b: reader.u8()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[self.r, self.g, self.b]);
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LightChunk {
    pub colors: LightColors,
    // Not normalized; only the direction is meaningful.
    pub directions: [VertexPos; 3],
    pub ambient: Rgb888,
    pub background: [Rgb888; 2],
    pub footer: Vec<u8>,
}

impl LightChunk {
    pub const BYTE_SIZE: usize =
        LightColors::BYTE_SIZE + 3 * VertexPos::BYTE_SIZE + 3 * Rgb888::BYTE_SIZE;

    pub fn from_bytes(index: usize, data: &[u8]) -> Result<Self> {
        let mut reader = ChunkReader::new(index, data);
        reader.require(Self::BYTE_SIZE)?;
        let colors = LightColors::read(&mut reader)?;
        let directions = [
            VertexPos::read(&mut reader)?,
            VertexPos::read(&mut reader)?,
            VertexPos::read(&mut reader)?,
        ];
        let ambient = Rgb888::read(&mut reader)?;
        let background = [Rgb888::read(&mut reader)?, Rgb888::read(&mut reader)?];
        Ok(Self {
            colors,
            directions,
            ambient,
            background,
            footer: reader.rest().to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::BYTE_SIZE + self.footer.len());
        self.colors.write(&mut out)?;
        for dir in &self.directions {
            dir.write(&mut out)?;
        }
        self.ambient.write(&mut out);
        for bg in &self.background {
            bg.write(&mut out);
        }
        out.extend_from_slice(&self.footer);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResError, CHUNK_LIGHTS};
    use approx::assert_relative_eq;

    fn sample() -> Vec<u8> {
        let mut data = Vec::new();
        // reds, greens, blues
        for v in [0x07FFu16, 0x0400, 0xF800, 0, 0, 0, 0x0200, 0, 0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        // directions
        for v in [100i16, -200, 300, 0, 4096, 0, -1, -1, -1] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&[10, 20, 30]);
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        data
    }

    #[test]
    fn it_reads_lights() -> Result<()> {
        let mut data = sample();
        assert_eq!(data.len(), LightChunk::BYTE_SIZE);
        data.extend_from_slice(&[0xDE, 0xAD]);
        let chunk = LightChunk::from_bytes(CHUNK_LIGHTS, &data)?;
        assert_eq!(chunk.colors.channels(0), Some([0x07FF, 0, 0x0200]));
        assert_relative_eq!(chunk.colors.color(0).unwrap()[0], 1.0);
        assert_relative_eq!(chunk.colors.color(1).unwrap()[0], 1024.0 / 2047.0);
        // upper bits do not leak into the channel
        assert_eq!(chunk.colors.channels(2), Some([0, 0, 0]));
        assert_eq!(chunk.colors.channels(3), None);
        assert!(chunk.colors.color(3).is_none());
        assert_eq!(chunk.directions[0], VertexPos { x: 100, y: -200, z: 300 });
        assert_eq!(chunk.ambient, Rgb888 { r: 10, g: 20, b: 30 });
        assert_eq!(chunk.background[1], Rgb888 { r: 4, g: 5, b: 6 });
        assert_eq!(chunk.footer, vec![0xDE, 0xAD]);
        assert_eq!(chunk.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_rejects_short_lights() {
        let data = sample();
        let err = LightChunk::from_bytes(CHUNK_LIGHTS, &data[..40]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkTruncated {
                index: CHUNK_LIGHTS,
                expected: 45,
                actual: 40
            })
        );
    }
}
