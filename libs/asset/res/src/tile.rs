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
use crate::{reader::ChunkReader, ResError, CHUNK_TILES};
use anyhow::Result;

/// One terrain cell. Heights and depths are in half-tile units. The slope
/// fields are kept raw; which corners a slope type raises is not decoded.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Tile {
    pub surface_type: u8,
    pub unk0_6: u8,
    pub unk1: u8,
    pub half_height: u8,
    pub slope_height: u8,
    pub depth: u8,
    pub slope_type: u8,
    pub thickness: u8,
    pub cant_cursor: bool,
    pub cant_walk: bool,
    pub unk6_2: u8,
    /// Bits 0-3: ne/se/sw/nw bottom, bits 4-7: ne/se/sw/nw top.
    pub rot_flags: u8,
}

impl Tile {
    pub const BYTE_SIZE: usize = 8;

    const SURFACE_BITS: u32 = 6;
    const SURFACE_MASK: u8 = (1 << Self::SURFACE_BITS) - 1;
    const SLOPE_HEIGHT_BITS: u32 = 5;
    const SLOPE_HEIGHT_MASK: u8 = (1 << Self::SLOPE_HEIGHT_BITS) - 1;
    const CANT_CURSOR_BIT: u8 = 1 << 0;
    const CANT_WALK_BIT: u8 = 1 << 1;
    const UNK6_SHIFT: u32 = 2;

    fn read(reader: &mut ChunkReader) -> Result<Self> {
        let b = reader.take(Self::BYTE_SIZE)?;
        Ok(Self {
            surface_type: b[0] & Self::SURFACE_MASK,
            unk0_6: b[0] >> Self::SURFACE_BITS,
            unk1: b[1],
            half_height: b[2],
            slope_height: b[3] & Self::SLOPE_HEIGHT_MASK,
            depth: b[3] >> Self::SLOPE_HEIGHT_BITS,
            slope_type: b[4],
            thickness: b[5],
            cant_cursor: b[6] & Self::CANT_CURSOR_BIT != 0,
            cant_walk: b[6] & Self::CANT_WALK_BIT != 0,
            unk6_2: b[6] >> Self::UNK6_SHIFT,
            rot_flags: b[7],
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        let mut b6 = self.unk6_2 << Self::UNK6_SHIFT;
        if self.cant_cursor {
            b6 |= Self::CANT_CURSOR_BIT;
        }
        if self.cant_walk {
            b6 |= Self::CANT_WALK_BIT;
        }
        out.extend_from_slice(&[
            (self.surface_type & Self::SURFACE_MASK) | (self.unk0_6 << Self::SURFACE_BITS),
            self.unk1,
            self.half_height,
            (self.slope_height & Self::SLOPE_HEIGHT_MASK) | (self.depth << Self::SLOPE_HEIGHT_BITS),
            self.slope_type,
            self.thickness,
            b6,
            self.rot_flags,
        ]);
    }
}

const LEVELS: usize = 2;

fn read_tiles(reader: &mut ChunkReader, n: usize) -> Result<Vec<Tile>> {
    (0..n).map(|_| Tile::read(reader)).collect()
}

/// The terrain grid, chunk 0x1A.
///
/// Two stacked levels, each a row major `size_x` by `size_z` grid laid out in
/// a 256 slot block. The slots past the grid are padding; the first level's
/// padding is always present since the second level starts 256 slots in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TileChunk {
    pub size_x: u8,
    pub size_z: u8,
    pub levels: [Vec<Tile>; LEVELS],
    pub padding: [Vec<Tile>; LEVELS],
    pub footer: Vec<u8>,
}

impl TileChunk {
    pub const LEVELS: usize = LEVELS;
    pub const SLOTS_PER_LEVEL: usize = 256;
    pub const HEADER_SIZE: usize = 2;
    pub const ENCODED_SIZE: usize =
        Self::HEADER_SIZE + Self::LEVELS * Self::SLOTS_PER_LEVEL * Tile::BYTE_SIZE;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = ChunkReader::new(CHUNK_TILES, data);
        reader.require(Self::HEADER_SIZE)?;
        let size_x = reader.u8()?;
        let size_z = reader.u8()?;
        let area = usize::from(size_x) * usize::from(size_z);
        if area > Self::SLOTS_PER_LEVEL {
            return Err(ResError::TileGridTooLarge { size_x, size_z }.into());
        }
        reader.require(Self::HEADER_SIZE + Tile::BYTE_SIZE * (Self::SLOTS_PER_LEVEL + area))?;

        let level0 = read_tiles(&mut reader, area)?;
        let padding0 = read_tiles(&mut reader, Self::SLOTS_PER_LEVEL - area)?;
        let level1 = read_tiles(&mut reader, area)?;
        let available = (data.len() - reader.offset()) / Tile::BYTE_SIZE;
        let padding1 = read_tiles(&mut reader, available.min(Self::SLOTS_PER_LEVEL - area))?;

        Ok(Self {
            size_x,
            size_z,
            levels: [level0, level1],
            padding: [padding0, padding1],
            footer: reader.rest().to_vec(),
        })
    }

    /// Both levels are always written out to the full 256 slots.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let area = usize::from(self.size_x) * usize::from(self.size_z);
        if area > Self::SLOTS_PER_LEVEL {
            return Err(ResError::TileGridTooLarge {
                size_x: self.size_x,
                size_z: self.size_z,
            }
            .into());
        }
        let mut out = Vec::with_capacity(Self::ENCODED_SIZE + self.footer.len());
        out.push(self.size_x);
        out.push(self.size_z);
        for (level, padding) in self.levels.iter().zip(self.padding.iter()) {
            let start = out.len();
            // Tiles past the grid would spill into the next level.
            for tile in level.iter().chain(padding.iter()).take(Self::SLOTS_PER_LEVEL) {
                tile.write(&mut out);
            }
            out.resize(start + Self::SLOTS_PER_LEVEL * Tile::BYTE_SIZE, 0);
        }
        out.extend_from_slice(&self.footer);
        Ok(out)
    }

    pub fn tile(&self, level: usize, x: usize, z: usize) -> Option<&Tile> {
        if x >= usize::from(self.size_x) || z >= usize::from(self.size_z) {
            return None;
        }
        self.levels
            .get(level)?
            .get(z * usize::from(self.size_x) + x)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.levels.iter().flat_map(|level| level.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(size_x: u8, size_z: u8, slots: usize) -> Vec<u8> {
        let mut data = vec![size_x, size_z];
        for i in 0..slots {
            data.extend_from_slice(&[(i % 64) as u8, 0, i as u8, 0, 0, 0, 0, 0]);
        }
        data
    }

    #[test]
    fn it_unpacks_tile_bits() -> Result<()> {
        let mut data = vec![1, 1];
        data.extend_from_slice(&[0xC5, 0x11, 6, 0x63, 0x2A, 3, 0xFE, 0x81]);
        data.resize(TileChunk::ENCODED_SIZE, 0);
        let chunk = TileChunk::from_bytes(&data)?;
        let tile = chunk.tile(0, 0, 0).expect("tile");
        assert_eq!(tile.surface_type, 5);
        assert_eq!(tile.unk0_6, 3);
        assert_eq!(tile.unk1, 0x11);
        assert_eq!(tile.half_height, 6);
        assert_eq!(tile.slope_height, 3);
        assert_eq!(tile.depth, 3);
        assert_eq!(tile.slope_type, 0x2A);
        assert_eq!(tile.thickness, 3);
        assert!(!tile.cant_cursor);
        assert!(tile.cant_walk);
        assert_eq!(tile.unk6_2, 0x3F);
        assert_eq!(tile.rot_flags, 0x81);
        assert_eq!(chunk.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_reads_a_4x3_grid() -> Result<()> {
        let data = grid(4, 3, 256 + 12);
        let chunk = TileChunk::from_bytes(&data)?;
        assert_eq!(chunk.levels[0].len(), 12);
        assert_eq!(chunk.levels[1].len(), 12);
        assert_eq!(chunk.padding[0].len(), 244);
        assert!(chunk.padding[1].is_empty());
        assert!(chunk.footer.is_empty());
        assert_eq!(chunk.tile(1, 0, 0).expect("tile").half_height, 0);
        assert_eq!(chunk.tile(0, 3, 2).expect("tile").half_height, 11);
        assert!(chunk.tile(0, 4, 0).is_none());

        let out = chunk.to_bytes()?;
        assert_eq!(out.len(), 2 + 2 * 8 * 256);
        assert_eq!(&out[..data.len()], &data[..]);
        assert!(out[data.len()..].iter().all(|&b| b == 0));
        Ok(())
    }

    #[test]
    fn it_keeps_a_full_second_level() -> Result<()> {
        let mut data = grid(4, 3, 512);
        data.extend_from_slice(&[0xEE; 5]);
        let chunk = TileChunk::from_bytes(&data)?;
        assert_eq!(chunk.padding[1].len(), 244);
        assert_eq!(chunk.footer, vec![0xEE; 5]);
        assert_eq!(chunk.tiles().count(), 24);
        assert_eq!(chunk.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_rejects_short_grids() {
        let data = grid(4, 3, 256 + 11);
        let err = TileChunk::from_bytes(&data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkTruncated {
                index: CHUNK_TILES,
                expected: 2 + 8 * 268,
                actual: 2 + 8 * 267
            })
        );
    }

    #[test]
    fn it_rejects_oversized_grids() {
        let err = TileChunk::from_bytes(&grid(17, 16, 0)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::TileGridTooLarge {
                size_x: 17,
                size_z: 16
            })
        );
    }
}
