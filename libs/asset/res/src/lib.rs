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

// Non-texture map resources open with a table of 49 little endian u32 byte
// offsets, one per chunk type. A zero offset means the chunk is absent. Each
// chunk runs from its offset to the next populated offset, or to the end of
// the file, so chunks must appear in table order.
mod anim;
mod light;
mod mesh;
mod palette;
mod reader;
mod tile;
mod vis;

pub use crate::{
    anim::{AnimEntry, PalAnim, TexAnim, TexAnimChunk},
    light::{LightChunk, LightColors, Rgb888},
    mesh::{
        Bounds, MeshChunk, MeshHeader, Normal, QuadTex, QuadTexFace, QuadUntex, TexCoord, TexFace,
        TexPolygon, TilePos, TriTex, TriTexFace, TriUntex, UntexPolygon, VertexPos,
    },
    palette::{Palette, PaletteChunk, Rgba5551},
    tile::{Tile, TileChunk},
    vis::VisAngleChunk,
};

use anyhow::{ensure, Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info, trace, warn};
use std::{collections::BTreeMap, ops::Range};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ResError {
    #[error("resource of {actual} bytes is too short for a chunk table")]
    ChunkTableTruncated { actual: usize },
    #[error("chunk 0x{index:02X} has offset {offset} outside of the {len} byte resource")]
    ChunkOutOfBounds {
        index: usize,
        offset: usize,
        len: usize,
    },
    #[error("chunk 0x{index:02X} at offset {offset} precedes the previous chunk at {previous}")]
    ChunkOrder {
        index: usize,
        offset: usize,
        previous: usize,
    },
    #[error("chunk 0x{index:02X} needs {expected} bytes, but only {actual} are present")]
    ChunkTruncated {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown chunk type 0x{index:02X} ({len} bytes); keeping it opaque")]
    UnknownChunkType { index: usize, len: usize },
    #[error("{count} {kind} polygons do not fit in {capacity} slots")]
    TooManyPolygons {
        kind: &'static str,
        count: usize,
        capacity: usize,
    },
    #[error("a {size_x}x{size_z} tile grid does not fit in 256 tiles")]
    TileGridTooLarge { size_x: u8, size_z: u8 },
}

pub const NUM_CHUNKS: usize = 49;
pub const CHUNK_TABLE_SIZE: usize = NUM_CHUNKS * 4;
pub const SECTOR_SIZE: usize = 2048;

pub const CHUNK_MESH: usize = 0x10;
pub const CHUNK_COLOR_PALETTES: usize = 0x11;
pub const CHUNK_LIGHTS: usize = 0x19;
pub const CHUNK_TILES: usize = 0x1A;
pub const CHUNK_TEX_ANIMS: usize = 0x1B;
pub const CHUNK_PAL_ANIMS: usize = 0x1C;
pub const CHUNK_GRAY_PALETTES: usize = 0x1F;
pub const CHUNK_MESH_ANIMS: Range<usize> = 0x23..0x2C;
pub const CHUNK_VIS_ANGLES: usize = 0x2C;

/// Number of 2048 byte disc sectors needed to hold `len` bytes.
pub fn count_sectors(len: usize) -> usize {
    (len + SECTOR_SIZE - 1) / SECTOR_SIZE
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChunkKind {
    Mesh,
    ColorPalettes,
    Lights,
    Tiles,
    TexAnims,
    PalAnims,
    GrayPalettes,
    MeshAnim,
    VisAngles,
    Unknown,
}

impl ChunkKind {
    pub fn from_index(index: usize) -> Self {
        match index {
            CHUNK_MESH => Self::Mesh,
            CHUNK_COLOR_PALETTES => Self::ColorPalettes,
            CHUNK_LIGHTS => Self::Lights,
            CHUNK_TILES => Self::Tiles,
            CHUNK_TEX_ANIMS => Self::TexAnims,
            CHUNK_PAL_ANIMS => Self::PalAnims,
            CHUNK_GRAY_PALETTES => Self::GrayPalettes,
            CHUNK_VIS_ANGLES => Self::VisAngles,
            i if CHUNK_MESH_ANIMS.contains(&i) => Self::MeshAnim,
            _ => Self::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::ColorPalettes => "color palettes",
            Self::Lights => "lights",
            Self::Tiles => "tiles",
            Self::TexAnims => "texture animations",
            Self::PalAnims => "palette animations",
            Self::GrayPalettes => "gray palettes",
            Self::MeshAnim => "mesh animation",
            Self::VisAngles => "visibility angles",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkTable {
    offsets: [u32; NUM_CHUNKS],
}

impl ChunkTable {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < CHUNK_TABLE_SIZE {
            return Err(ResError::ChunkTableTruncated { actual: data.len() }.into());
        }
        let mut offsets = [0u32; NUM_CHUNKS];
        LittleEndian::read_u32_into(&data[..CHUNK_TABLE_SIZE], &mut offsets);
        Ok(Self { offsets })
    }

    pub fn offset(&self, index: usize) -> Option<usize> {
        match self.offsets.get(index) {
            Some(&0) | None => None,
            Some(&offset) => Some(offset as usize),
        }
    }

    /// Byte range of every populated chunk, in table order, for a resource of
    /// `len` bytes.
    pub fn ranges(&self, len: usize) -> Result<Vec<(usize, Range<usize>)>> {
        let populated = (0..NUM_CHUNKS)
            .filter_map(|index| self.offset(index).map(|offset| (index, offset)))
            .collect::<Vec<_>>();
        let mut out = Vec::with_capacity(populated.len());
        let mut previous = CHUNK_TABLE_SIZE;
        for (i, &(index, offset)) in populated.iter().enumerate() {
            if offset < CHUNK_TABLE_SIZE || offset > len {
                return Err(ResError::ChunkOutOfBounds { index, offset, len }.into());
            }
            if offset < previous {
                return Err(ResError::ChunkOrder {
                    index,
                    offset,
                    previous,
                }
                .into());
            }
            previous = offset;
            let end = populated
                .get(i + 1)
                .map(|&(_, next)| next.clamp(offset, len))
                .unwrap_or(len);
            out.push((index, offset..end));
        }
        Ok(out)
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Clone, Debug, PartialEq)]
pub enum Chunk {
    Mesh(MeshChunk),
    ColorPalettes(PaletteChunk),
    Lights(LightChunk),
    Tiles(TileChunk),
    TexAnims(TexAnimChunk),
    PalAnims(PaletteChunk),
    GrayPalettes(PaletteChunk),
    VisAngles(VisAngleChunk),
    Opaque(Vec<u8>),
}

impl Chunk {
    /// Decode the bytes of the chunk in slot `index`. The mesh needs the
    /// visibility chunk, when there is one, to fill in per-polygon masks.
    /// Slots without a codec may be empty; every other kind must hold at least
    /// its fixed layout.
    pub fn from_bytes(index: usize, data: &[u8], vis: Option<&VisAngleChunk>) -> Result<Self> {
        Ok(match ChunkKind::from_index(index) {
            ChunkKind::Mesh => Chunk::Mesh(MeshChunk::from_bytes(data, vis)?),
            ChunkKind::ColorPalettes => Chunk::ColorPalettes(PaletteChunk::from_bytes(index, data)?),
            ChunkKind::Lights => Chunk::Lights(LightChunk::from_bytes(index, data)?),
            ChunkKind::Tiles => Chunk::Tiles(TileChunk::from_bytes(data)?),
            ChunkKind::TexAnims => Chunk::TexAnims(TexAnimChunk::from_bytes(data)?),
            ChunkKind::PalAnims => Chunk::PalAnims(PaletteChunk::from_bytes(index, data)?),
            ChunkKind::GrayPalettes => Chunk::GrayPalettes(PaletteChunk::from_bytes(index, data)?),
            ChunkKind::VisAngles => Chunk::VisAngles(VisAngleChunk::from_bytes(data)?),
            ChunkKind::MeshAnim => Chunk::Opaque(data.to_vec()),
            ChunkKind::Unknown => {
                warn!(
                    "{}",
                    ResError::UnknownChunkType {
                        index,
                        len: data.len()
                    }
                );
                Chunk::Opaque(data.to_vec())
            }
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Chunk::Mesh(chunk) => chunk.to_bytes()?,
            Chunk::ColorPalettes(chunk) | Chunk::PalAnims(chunk) | Chunk::GrayPalettes(chunk) => {
                chunk.to_bytes()?
            }
            Chunk::Lights(chunk) => chunk.to_bytes()?,
            Chunk::Tiles(chunk) => chunk.to_bytes()?,
            Chunk::TexAnims(chunk) => chunk.to_bytes()?,
            Chunk::VisAngles(chunk) => chunk.to_bytes()?,
            Chunk::Opaque(data) => data.clone(),
        })
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Chunk::Opaque(_))
    }
}

/// A decoded non-texture resource: every populated chunk, keyed by its slot
/// in the chunk table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceFile {
    num_sectors: usize,
    chunks: BTreeMap<usize, Chunk>,
}

impl ResourceFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let table = ChunkTable::from_bytes(data)?;
        let ranges = table.ranges(data.len())?;
        if let Some((_, first)) = ranges.first() {
            if first.start > CHUNK_TABLE_SIZE {
                warn!(
                    "dropping {} bytes between the chunk table and the first chunk",
                    first.start - CHUNK_TABLE_SIZE
                );
            }
        }

        let context = |index: usize, range: &Range<usize>| {
            format!(
                "decoding chunk 0x{:02X} at bytes {}..{}",
                index, range.start, range.end
            )
        };

        let vis = match ranges.iter().find(|(index, _)| *index == CHUNK_VIS_ANGLES) {
            Some((index, range)) => Some(
                VisAngleChunk::from_bytes(&data[range.clone()])
                    .with_context(|| context(*index, range))?,
            ),
            None => None,
        };

        let mut chunks = BTreeMap::new();
        for (index, range) in &ranges {
            trace!(
                "chunk 0x{:02X} ({}): {} bytes",
                index,
                ChunkKind::from_index(*index).name(),
                range.len()
            );
            let chunk = match (&vis, *index) {
                (Some(vis), CHUNK_VIS_ANGLES) => Chunk::VisAngles(vis.clone()),
                _ => Chunk::from_bytes(*index, &data[range.clone()], vis.as_ref())
                    .with_context(|| context(*index, range))?,
            };
            chunks.insert(*index, chunk);
        }
        debug!("decoded {} chunks from {} bytes", chunks.len(), data.len());

        Ok(Self {
            num_sectors: count_sectors(data.len()),
            chunks,
        })
    }

    /// Lay every chunk out back to back after the table, in table order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut table = [0u32; NUM_CHUNKS];
        let mut body = Vec::new();
        for (&index, chunk) in &self.chunks {
            ensure!(
                index < NUM_CHUNKS,
                "chunk index 0x{:02X} is past the end of the chunk table",
                index
            );
            let offset = CHUNK_TABLE_SIZE + body.len();
            table[index] = u32::try_from(offset)
                .with_context(|| format!("chunk 0x{:02X} offset {} overflows", index, offset))?;
            body.extend_from_slice(
                &chunk
                    .to_bytes()
                    .with_context(|| format!("encoding chunk 0x{:02X}", index))?,
            );
        }
        let mut out = vec![0u8; CHUNK_TABLE_SIZE];
        LittleEndian::write_u32_into(&table, &mut out);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Encode, then note how the sector count moved since the last decode or
    /// encode. A resource that grew may no longer fit where it was on disc.
    pub fn encode(&mut self) -> Result<Vec<u8>> {
        let out = self.to_bytes()?;
        let sectors = count_sectors(out.len());
        if sectors > self.num_sectors {
            warn!(
                "resource grew from {} to {} sectors",
                self.num_sectors, sectors
            );
        } else if sectors < self.num_sectors {
            info!(
                "resource shrank from {} to {} sectors",
                self.num_sectors, sectors
            );
        }
        self.num_sectors = sectors;
        Ok(out)
    }

    pub fn num_sectors(&self) -> usize {
        self.num_sectors
    }

    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(&index)
    }

    pub fn chunk_mut(&mut self, index: usize) -> Option<&mut Chunk> {
        self.chunks.get_mut(&index)
    }

    pub fn insert(&mut self, index: usize, chunk: Chunk) -> Option<Chunk> {
        self.chunks.insert(index, chunk)
    }

    pub fn remove(&mut self, index: usize) -> Option<Chunk> {
        self.chunks.remove(&index)
    }

    pub fn chunks(&self) -> impl Iterator<Item = (usize, &Chunk)> + '_ {
        self.chunks.iter().map(|(&index, chunk)| (index, chunk))
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.chunks.keys().copied()
    }

    pub fn mesh(&self) -> Option<&MeshChunk> {
        match self.chunk(CHUNK_MESH) {
            Some(Chunk::Mesh(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn color_palettes(&self) -> Option<&PaletteChunk> {
        match self.chunk(CHUNK_COLOR_PALETTES) {
            Some(Chunk::ColorPalettes(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn gray_palettes(&self) -> Option<&PaletteChunk> {
        match self.chunk(CHUNK_GRAY_PALETTES) {
            Some(Chunk::GrayPalettes(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn lights(&self) -> Option<&LightChunk> {
        match self.chunk(CHUNK_LIGHTS) {
            Some(Chunk::Lights(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn tiles(&self) -> Option<&TileChunk> {
        match self.chunk(CHUNK_TILES) {
            Some(Chunk::Tiles(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn tex_anims(&self) -> Option<&TexAnimChunk> {
        match self.chunk(CHUNK_TEX_ANIMS) {
            Some(Chunk::TexAnims(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn pal_anims(&self) -> Option<&PaletteChunk> {
        match self.chunk(CHUNK_PAL_ANIMS) {
            Some(Chunk::PalAnims(chunk)) => Some(chunk),
            _ => None,
        }
    }

    pub fn vis_angles(&self) -> Option<&VisAngleChunk> {
        match self.chunk(CHUNK_VIS_ANGLES) {
            Some(Chunk::VisAngles(chunk)) => Some(chunk),
            _ => None,
        }
    }

    /// Copy the mesh's per-polygon visibility back into the visibility chunk.
    /// Does nothing unless both are present.
    pub fn sync_visibility(&mut self) -> Result<()> {
        let vis = match (self.mesh(), self.vis_angles()) {
            (Some(mesh), Some(vis)) => {
                let mut vis = vis.clone();
                vis.update_from_mesh(mesh)?;
                vis
            }
            _ => return Ok(()),
        };
        self.chunks.insert(CHUNK_VIS_ANGLES, Chunk::VisAngles(vis));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(chunks: &[(usize, Vec<u8>)]) -> Vec<u8> {
        let mut out = vec![0u8; CHUNK_TABLE_SIZE];
        for (index, data) in chunks {
            let offset = out.len() as u32;
            LittleEndian::write_u32(&mut out[index * 4..], offset);
            out.extend_from_slice(data);
        }
        out
    }

    fn palettes(seed: u8) -> Vec<u8> {
        (0..PaletteChunk::BYTE_SIZE)
            .map(|i| (i as u8).wrapping_mul(seed))
            .collect()
    }

    #[test]
    fn it_counts_sectors() {
        assert_eq!(count_sectors(0), 0);
        assert_eq!(count_sectors(1), 1);
        assert_eq!(count_sectors(2048), 1);
        assert_eq!(count_sectors(2049), 2);
    }

    #[test]
    fn it_classifies_chunk_indices() {
        assert_eq!(ChunkKind::from_index(0x10), ChunkKind::Mesh);
        assert_eq!(ChunkKind::from_index(0x1A), ChunkKind::Tiles);
        assert_eq!(ChunkKind::from_index(0x23), ChunkKind::MeshAnim);
        assert_eq!(ChunkKind::from_index(0x2B), ChunkKind::MeshAnim);
        assert_eq!(ChunkKind::from_index(0x2C), ChunkKind::VisAngles);
        assert_eq!(ChunkKind::from_index(0x13), ChunkKind::Unknown);
    }

    #[test]
    fn it_finds_chunk_ranges() -> Result<()> {
        let data = build(&[(0x11, palettes(3)), (0x13, vec![1, 2, 3]), (0x23, vec![4; 10])]);
        let table = ChunkTable::from_bytes(&data)?;
        let ranges = table.ranges(data.len())?;
        assert_eq!(
            ranges,
            vec![
                (0x11, 196..708),
                (0x13, 708..711),
                (0x23, 711..721),
            ]
        );
        assert_eq!(table.offset(0x10), None);
        Ok(())
    }

    #[test]
    fn it_writes_what_it_read() -> Result<()> {
        let data = build(&[
            (0x11, palettes(3)),
            (0x13, vec![1, 2, 3]),
            (0x1F, palettes(5)),
            (0x23, vec![4; 10]),
        ]);
        let res = ResourceFile::from_bytes(&data)?;
        assert_eq!(res.indices().collect::<Vec<usize>>(), vec![0x11, 0x13, 0x1F, 0x23]);
        assert!(res.color_palettes().is_some());
        assert!(res.gray_palettes().is_some());
        assert!(res.chunk(0x13).expect("chunk").is_opaque());
        assert_eq!(res.chunk(0x23), Some(&Chunk::Opaque(vec![4; 10])));
        assert_eq!(res.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_lays_chunks_out_contiguously() -> Result<()> {
        let mut res = ResourceFile::new();
        res.insert(0x2A, Chunk::Opaque(vec![7; 5]));
        res.insert(0x11, Chunk::ColorPalettes(PaletteChunk::from_bytes(0x11, &palettes(1))?));
        let data = res.to_bytes()?;
        let table = ChunkTable::from_bytes(&data)?;
        assert_eq!(table.offset(0x11), Some(CHUNK_TABLE_SIZE));
        assert_eq!(table.offset(0x2A), Some(CHUNK_TABLE_SIZE + PaletteChunk::BYTE_SIZE));
        assert_eq!(data.len(), CHUNK_TABLE_SIZE + PaletteChunk::BYTE_SIZE + 5);
        assert_eq!(table.offset(0x10), None);
        assert_eq!(res.chunks().count(), 2);
        Ok(())
    }

    #[test]
    fn it_decodes_visibility_before_the_mesh() -> Result<()> {
        let mut vis = vec![0u8; VisAngleChunk::BYTE_SIZE];
        vis[VisAngleChunk::HEADER_SIZE] = 0x0F;
        let data = build(&[(0x10, mesh::tests::sample_mesh()), (0x2C, vis)]);
        let res = ResourceFile::from_bytes(&data)?;
        let mesh = res.mesh().expect("mesh");
        assert_eq!(mesh.tri_tex[0].visibility, Some(0x0F));
        assert_eq!(mesh.quad_tex[0].visibility, Some(0));
        assert_eq!(res.vis_angles().expect("vis").tri_tex[0], 0x0F);
        assert_eq!(res.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_syncs_visibility_from_the_mesh() -> Result<()> {
        let data = build(&[
            (0x10, mesh::tests::sample_mesh()),
            (0x2C, vec![0u8; VisAngleChunk::BYTE_SIZE]),
        ]);
        let mut res = ResourceFile::from_bytes(&data)?;
        if let Some(Chunk::Mesh(mesh)) = res.chunk_mut(CHUNK_MESH) {
            mesh.quad_tex[0].visibility = Some(0x4000);
        }
        res.sync_visibility()?;
        assert_eq!(res.vis_angles().expect("vis").quad_tex[0], 0x4000);
        Ok(())
    }

    #[test]
    fn it_keeps_empty_opaque_chunks() -> Result<()> {
        let data = build(&[(0x13, vec![]), (0x23, vec![]), (0x24, vec![1])]);
        let res = ResourceFile::from_bytes(&data)?;
        assert_eq!(res.chunk(0x13), Some(&Chunk::Opaque(vec![])));
        assert_eq!(res.chunk(0x23), Some(&Chunk::Opaque(vec![])));
        assert_eq!(res.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_rejects_empty_known_chunks() {
        let data = build(&[(0x11, vec![]), (0x19, vec![0u8; LightChunk::BYTE_SIZE])]);
        let err = ResourceFile::from_bytes(&data).unwrap_err();
        assert_eq!(err.to_string(), "decoding chunk 0x11 at bytes 196..196");
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkTruncated {
                index: 0x11,
                expected: PaletteChunk::BYTE_SIZE,
                actual: 0
            })
        );

        let data = build(&[(0x10, vec![]), (0x2C, vec![])]);
        let err = ResourceFile::from_bytes(&data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkTruncated {
                index: CHUNK_VIS_ANGLES,
                expected: VisAngleChunk::BYTE_SIZE,
                actual: 0
            })
        );
    }

    #[test]
    fn it_drops_bytes_before_the_first_chunk() -> Result<()> {
        let mut data = vec![0u8; CHUNK_TABLE_SIZE];
        LittleEndian::write_u32(&mut data[0x23 * 4..], (CHUNK_TABLE_SIZE + 4) as u32);
        data.extend_from_slice(&[0xAA; 4]);
        data.extend_from_slice(&[1, 2]);
        let res = ResourceFile::from_bytes(&data)?;
        assert_eq!(res.chunk(0x23), Some(&Chunk::Opaque(vec![1, 2])));
        assert_eq!(res.to_bytes()?.len(), CHUNK_TABLE_SIZE + 2);
        Ok(())
    }

    #[test]
    fn it_rejects_short_tables() {
        let err = ResourceFile::from_bytes(&[0u8; 100]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkTableTruncated { actual: 100 })
        );
    }

    #[test]
    fn it_rejects_offsets_inside_the_table() {
        let mut data = vec![0u8; 300];
        LittleEndian::write_u32(&mut data[0x11 * 4..], 10);
        let err = ResourceFile::from_bytes(&data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkOutOfBounds {
                index: 0x11,
                offset: 10,
                len: 300
            })
        );
    }

    #[test]
    fn it_rejects_offsets_past_the_end() {
        let mut data = vec![0u8; 300];
        LittleEndian::write_u32(&mut data[0x23 * 4..], 301);
        let err = ResourceFile::from_bytes(&data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkOutOfBounds {
                index: 0x23,
                offset: 301,
                len: 300
            })
        );
    }

    #[test]
    fn it_rejects_decreasing_offsets() {
        let mut data = vec![0u8; 300];
        LittleEndian::write_u32(&mut data[0x23 * 4..], 250);
        LittleEndian::write_u32(&mut data[0x24 * 4..], 200);
        let err = ResourceFile::from_bytes(&data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkOrder {
                index: 0x24,
                offset: 200,
                previous: 250
            })
        );
    }

    #[test]
    fn it_names_the_failing_chunk() {
        let data = build(&[(0x19, vec![0u8; 20])]);
        let err = ResourceFile::from_bytes(&data).unwrap_err();
        assert_eq!(
            err.to_string(),
            "decoding chunk 0x19 at bytes 196..216"
        );
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkTruncated {
                index: 0x19,
                expected: LightChunk::BYTE_SIZE,
                actual: 20
            })
        );
    }

    #[test]
    fn it_tracks_sector_changes() -> Result<()> {
        let data = build(&[(0x23, vec![0u8; 3000])]);
        let mut res = ResourceFile::from_bytes(&data)?;
        assert_eq!(res.num_sectors(), 2);
        res.insert(0x23, Chunk::Opaque(vec![0u8; 10]));
        res.encode()?;
        assert_eq!(res.num_sectors(), 1);
        res.insert(0x24, Chunk::Opaque(vec![0u8; 5000]));
        res.encode()?;
        assert_eq!(res.num_sectors(), 3);
        Ok(())
    }
}
