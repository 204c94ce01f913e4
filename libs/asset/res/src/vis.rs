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
use crate::{mesh::MeshChunk, reader::ChunkReader, ResError, CHUNK_VIS_ANGLES};
use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};

const TRI_TEX_CAPACITY: usize = 512;
const QUAD_TEX_CAPACITY: usize = 768;
const TRI_UNTEX_CAPACITY: usize = 64;
const QUAD_UNTEX_CAPACITY: usize = 256;

/// Per-polygon visibility masks for chunk 0x2C, one u16 per mesh polygon in
/// mesh order. Each bit marks a camera angle the polygon is drawn from. The
/// arrays are fixed size no matter how many polygons the mesh holds; slots past
/// the mesh's counts are zero.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VisAngleChunk {
    pub header: Vec<u8>,
    pub tri_tex: [u16; TRI_TEX_CAPACITY],
    pub quad_tex: [u16; QUAD_TEX_CAPACITY],
    pub tri_untex: [u16; TRI_UNTEX_CAPACITY],
    pub quad_untex: [u16; QUAD_UNTEX_CAPACITY],
    pub footer: Vec<u8>,
}

impl VisAngleChunk {
    pub const HEADER_SIZE: usize = 0x380;
    pub const TRI_TEX_CAPACITY: usize = TRI_TEX_CAPACITY;
    pub const QUAD_TEX_CAPACITY: usize = QUAD_TEX_CAPACITY;
    pub const TRI_UNTEX_CAPACITY: usize = TRI_UNTEX_CAPACITY;
    pub const QUAD_UNTEX_CAPACITY: usize = QUAD_UNTEX_CAPACITY;
    pub const BYTE_SIZE: usize = Self::HEADER_SIZE
        + 2 * (Self::TRI_TEX_CAPACITY
            + Self::QUAD_TEX_CAPACITY
            + Self::TRI_UNTEX_CAPACITY
            + Self::QUAD_UNTEX_CAPACITY);

    pub fn empty() -> Self {
        Self {
            header: vec![0u8; Self::HEADER_SIZE],
            tri_tex: [0; Self::TRI_TEX_CAPACITY],
            quad_tex: [0; Self::QUAD_TEX_CAPACITY],
            tri_untex: [0; Self::TRI_UNTEX_CAPACITY],
            quad_untex: [0; Self::QUAD_UNTEX_CAPACITY],
            footer: Vec::new(),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = ChunkReader::new(CHUNK_VIS_ANGLES, data);
        reader.require(Self::BYTE_SIZE)?;
        let mut out = Self::empty();
        out.header = reader.take(Self::HEADER_SIZE)?.to_vec();
        for slots in [
            &mut out.tri_tex[..],
            &mut out.quad_tex[..],
            &mut out.tri_untex[..],
            &mut out.quad_untex[..],
        ] {
            for slot in slots.iter_mut() {
                *slot = reader.u16()?;
            }
        }
        out.footer = reader.rest().to_vec();
        Ok(out)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::BYTE_SIZE + self.footer.len());
        out.extend_from_slice(&self.header);
        out.resize(Self::HEADER_SIZE, 0);
        for slots in [
            &self.tri_tex[..],
            &self.quad_tex[..],
            &self.tri_untex[..],
            &self.quad_untex[..],
        ] {
            for &v in slots {
                out.write_u16::<LittleEndian>(v)?;
            }
        }
        out.extend_from_slice(&self.footer);
        Ok(out)
    }

    /// Rewrite every slot from the mesh's per-polygon visibility. Polygons
    /// without a mask get 0, as do all slots past the mesh's counts.
    pub fn update_from_mesh(&mut self, mesh: &MeshChunk) -> Result<()> {
        fill(
            "textured triangle",
            &mut self.tri_tex,
            mesh.tri_tex.iter().map(|p| p.visibility),
        )?;
        fill(
            "textured quad",
            &mut self.quad_tex,
            mesh.quad_tex.iter().map(|p| p.visibility),
        )?;
        fill(
            "untextured triangle",
            &mut self.tri_untex,
            mesh.tri_untex.iter().map(|p| p.visibility),
        )?;
        fill(
            "untextured quad",
            &mut self.quad_untex,
            mesh.quad_untex.iter().map(|p| p.visibility),
        )?;
        Ok(())
    }
}

fn fill(
    kind: &'static str,
    slots: &mut [u16],
    values: impl ExactSizeIterator<Item = Option<u16>>,
) -> Result<()> {
    if values.len() > slots.len() {
        return Err(ResError::TooManyPolygons {
            kind,
            count: values.len(),
            capacity: slots.len(),
        }
        .into());
    }
    slots.fill(0);
    for (slot, v) in slots.iter_mut().zip(values) {
        *slot = v.unwrap_or(0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::sample_mesh;

    #[test]
    fn it_always_has_full_capacity() -> Result<()> {
        let mut data = vec![0u8; VisAngleChunk::BYTE_SIZE];
        // first quad slot
        let at = VisAngleChunk::HEADER_SIZE + 2 * VisAngleChunk::TRI_TEX_CAPACITY;
        data[at] = 0x34;
        data[at + 1] = 0x12;
        let vis = VisAngleChunk::from_bytes(&data)?;
        assert_eq!(vis.tri_tex.len(), 512);
        assert_eq!(vis.quad_tex.len(), 768);
        assert_eq!(vis.tri_untex.len(), 64);
        assert_eq!(vis.quad_untex.len(), 256);
        assert_eq!(vis.quad_tex[0], 0x1234);
        assert!(vis.footer.is_empty());
        assert_eq!(vis.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_keeps_header_and_footer() -> Result<()> {
        let mut data = (0..VisAngleChunk::BYTE_SIZE)
            .map(|i| (i % 253) as u8)
            .collect::<Vec<u8>>();
        data.extend_from_slice(&[9, 9, 9]);
        let vis = VisAngleChunk::from_bytes(&data)?;
        assert_eq!(vis.header.len(), VisAngleChunk::HEADER_SIZE);
        assert_eq!(vis.footer, vec![9, 9, 9]);
        assert_eq!(vis.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_rejects_short_chunks() {
        let err = VisAngleChunk::from_bytes(&[0u8; 0x380]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkTruncated {
                index: CHUNK_VIS_ANGLES,
                expected: 4096,
                actual: 0x380
            })
        );
    }

    #[test]
    fn it_updates_from_a_mesh() -> Result<()> {
        let mut mesh = MeshChunk::from_bytes(&sample_mesh(), None)?;
        mesh.tri_tex[0].visibility = Some(0x8001);
        mesh.tri_untex[0].visibility = Some(0x0002);
        let mut vis = VisAngleChunk::empty();
        vis.tri_tex[1] = 0xFFFF;
        vis.update_from_mesh(&mesh)?;
        assert_eq!(vis.tri_tex[0], 0x8001);
        assert_eq!(vis.tri_tex[1], 0);
        assert_eq!(vis.quad_tex[0], 0);
        assert_eq!(vis.tri_untex[0], 0x0002);
        Ok(())
    }

    #[test]
    fn it_rejects_meshes_past_capacity() -> Result<()> {
        let mut mesh = MeshChunk::from_bytes(&sample_mesh(), None)?;
        let extra = mesh.tri_untex[0];
        mesh.tri_untex = vec![extra; 65];
        let err = VisAngleChunk::empty().update_from_mesh(&mesh).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::TooManyPolygons {
                kind: "untextured triangle",
                count: 65,
                capacity: 64
            })
        );
        Ok(())
    }
}
