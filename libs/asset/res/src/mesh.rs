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

// Chunk 0x10 is the static map geometry. After an 8 byte header of polygon
// counts, every section is a flat array whose length is derived from those
// counts; nothing else in the chunk says how long anything is:
//
//   header        4 x u16: textured tris, textured quads, untextured tris, untextured quads
//   positions     3 x i16 per vertex; tex tris, tex quads, untex tris, untex quads
//   normals       3 x i16 per vertex (1/4096 fixed point); tex tris, tex quads
//   faces         10 bytes per tex tri, 12 bytes per tex quad
//   tags          u32 per untex tri, then per untex quad; nearly always 1
//   tile pos      2 bytes per tex tri, then per tex quad
//
// Untextured polygons carry neither normals nor tile positions.
use crate::{reader::ChunkReader, vis::VisAngleChunk, ResError, CHUNK_MESH};
use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct MeshHeader {
    pub num_tri_tex: u16,
    pub num_quad_tex: u16,
    pub num_tri_untex: u16,
    pub num_quad_untex: u16,
}

impl MeshHeader {
    pub const BYTE_SIZE: usize = 8;

    fn read(reader: &mut ChunkReader) -> Result<Self> {
        Ok(Self {
            num_tri_tex: reader.u16()?,
            num_quad_tex: reader.u16()?,
            num_tri_untex: reader.u16()?,
            num_quad_untex: reader.u16()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_u16::<LittleEndian>(self.num_tri_tex)?;
        out.write_u16::<LittleEndian>(self.num_quad_tex)?;
        out.write_u16::<LittleEndian>(self.num_tri_untex)?;
        out.write_u16::<LittleEndian>(self.num_quad_untex)?;
        Ok(())
    }

    /// Bytes of structured content a mesh with these counts occupies.
    pub fn encoded_size(&self) -> usize {
        let tt = self.num_tri_tex as usize;
        let qt = self.num_quad_tex as usize;
        let tu = self.num_tri_untex as usize;
        let qu = self.num_quad_untex as usize;
        let tex_vertices = 3 * tt + 4 * qt;
        let untex_vertices = 3 * tu + 4 * qu;
        Self::BYTE_SIZE
            + VertexPos::BYTE_SIZE * (tex_vertices + untex_vertices)
            + Normal::BYTE_SIZE * tex_vertices
            + TriTexFace::BYTE_SIZE * tt
            + QuadTexFace::BYTE_SIZE * qt
            + 4 * (tu + qu)
            + TilePos::BYTE_SIZE * (tt + qt)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct VertexPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl VertexPos {
    pub const BYTE_SIZE: usize = 6;

    pub(crate) fn read(reader: &mut ChunkReader) -> Result<Self> {
        Ok(Self {
            x: reader.i16()?,
            y: reader.i16()?,
            z: reader.i16()?,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_i16::<LittleEndian>(self.x)?;
        out.write_i16::<LittleEndian>(self.y)?;
        out.write_i16::<LittleEndian>(self.z)?;
        Ok(())
    }

    pub fn as_array(&self) -> [i16; 3] {
        [self.x, self.y, self.z]
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Normal {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Normal {
    pub const BYTE_SIZE: usize = 6;
    pub const ONE: f32 = 4096.0;

    fn read(reader: &mut ChunkReader) -> Result<Self> {
        Ok(Self {
            x: reader.i16()?,
            y: reader.i16()?,
            z: reader.i16()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.write_i16::<LittleEndian>(self.x)?;
        out.write_i16::<LittleEndian>(self.y)?;
        out.write_i16::<LittleEndian>(self.z)?;
        Ok(())
    }

    pub fn to_f32(&self) -> [f32; 3] {
        [
            f32::from(self.x) / Self::ONE,
            f32::from(self.y) / Self::ONE,
            f32::from(self.z) / Self::ONE,
        ]
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TexCoord {
    pub x: u8,
    pub y: u8,
}

impl TexCoord {
    fn read(reader: &mut ChunkReader) -> Result<Self> {
        Ok(Self {
            x: reader.u8()?,
            y: reader.u8()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[self.x, self.y]);
    }
}

/// Per-face texture information for a textured polygon with `N` corners.
///
/// Layout: uv0, [palette:4 | unk2_4:4], unk3, uv1, [page:2 | unk6_2:6], unk7,
/// uv2, and for quads uv3. The page selects which 256 row band of the texture
/// the v coordinates are relative to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TexFace<const N: usize> {
    pub uvs: [TexCoord; N],
    pub palette: u8,
    pub unk2_4: u8,
    pub unk3: u8,
    pub page: u8,
    pub unk6_2: u8,
    pub unk7: u8,
}

pub type TriTexFace = TexFace<3>;
pub type QuadTexFace = TexFace<4>;

impl<const N: usize> Default for TexFace<N> {
    fn default() -> Self {
        Self {
            uvs: [TexCoord::default(); N],
            palette: 0,
            unk2_4: 0,
            unk3: 0,
            page: 0,
            unk6_2: 0,
            unk7: 0,
        }
    }
}

impl<const N: usize> TexFace<N> {
    pub const BYTE_SIZE: usize = 2 * N + 4;

    const PALETTE_BITS: u32 = 4;
    const PALETTE_MASK: u8 = (1 << Self::PALETTE_BITS) - 1;
    const PAGE_BITS: u32 = 2;
    const PAGE_MASK: u8 = (1 << Self::PAGE_BITS) - 1;

    fn read(reader: &mut ChunkReader) -> Result<Self> {
        let mut face = Self::default();
        face.uvs[0] = TexCoord::read(reader)?;
        let b2 = reader.u8()?;
        face.palette = b2 & Self::PALETTE_MASK;
        face.unk2_4 = b2 >> Self::PALETTE_BITS;
        face.unk3 = reader.u8()?;
        face.uvs[1] = TexCoord::read(reader)?;
        let b6 = reader.u8()?;
        face.page = b6 & Self::PAGE_MASK;
        face.unk6_2 = b6 >> Self::PAGE_BITS;
        face.unk7 = reader.u8()?;
        for uv in face.uvs.iter_mut().skip(2) {
            *uv = TexCoord::read(reader)?;
        }
        Ok(face)
    }

    fn write(&self, out: &mut Vec<u8>) {
        self.uvs[0].write(out);
        out.push((self.palette & Self::PALETTE_MASK) | (self.unk2_4 << Self::PALETTE_BITS));
        out.push(self.unk3);
        self.uvs[1].write(out);
        out.push((self.page & Self::PAGE_MASK) | (self.unk6_2 << Self::PAGE_BITS));
        out.push(self.unk7);
        for uv in self.uvs.iter().skip(2) {
            uv.write(out);
        }
    }
}

/// Which map tile a textured face sits on; `y` is the tile's height level.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TilePos {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl TilePos {
    pub const BYTE_SIZE: usize = 2;

    fn read(reader: &mut ChunkReader) -> Result<Self> {
        let x = reader.u8()?;
        let b1 = reader.u8()?;
        Ok(Self {
            x,
            y: b1 & 1,
            z: b1 >> 1,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.push(self.x);
        out.push((self.y & 1) | (self.z << 1));
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TexPolygon<const N: usize> {
    pub positions: [VertexPos; N],
    pub normals: [Normal; N],
    pub face: TexFace<N>,
    pub tile: TilePos,
    pub visibility: Option<u16>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UntexPolygon<const N: usize> {
    pub positions: [VertexPos; N],
    pub tag: u32,
    pub visibility: Option<u16>,
}

pub type TriTex = TexPolygon<3>;
pub type QuadTex = TexPolygon<4>;
pub type TriUntex = UntexPolygon<3>;
pub type QuadUntex = UntexPolygon<4>;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: [i16; 3],
    pub max: [i16; 3],
}

impl Bounds {
    pub fn from_positions<'a>(positions: impl Iterator<Item = &'a VertexPos>) -> Option<Self> {
        let mut out: Option<Self> = None;
        for p in positions {
            let v = p.as_array();
            out = Some(match out {
                None => Self { min: v, max: v },
                Some(mut b) => {
                    for i in 0..3 {
                        b.min[i] = b.min[i].min(v[i]);
                        b.max[i] = b.max[i].max(v[i]);
                    }
                    b
                }
            });
        }
        out
    }

    pub fn center(&self) -> [f32; 3] {
        let mut out = [0f32; 3];
        for (i, c) in out.iter_mut().enumerate() {
            *c = 0.5 * (f32::from(self.min[i]) + f32::from(self.max[i]));
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshChunk {
    pub tri_tex: Vec<TriTex>,
    pub quad_tex: Vec<QuadTex>,
    pub tri_untex: Vec<TriUntex>,
    pub quad_untex: Vec<QuadUntex>,
    pub footer: Vec<u8>,
    bounds: Option<Bounds>,
}

fn read_n<T>(
    reader: &mut ChunkReader,
    count: usize,
    f: impl Fn(&mut ChunkReader) -> Result<T>,
) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(f(reader)?);
    }
    Ok(out)
}

fn corners<T: Copy + Default, const N: usize>(items: &[T], polygon: usize) -> [T; N] {
    let mut out = [T::default(); N];
    out.copy_from_slice(&items[polygon * N..(polygon + 1) * N]);
    out
}

impl MeshChunk {
    pub fn from_bytes(data: &[u8], vis: Option<&VisAngleChunk>) -> Result<Self> {
        let mut reader = ChunkReader::new(CHUNK_MESH, data);
        reader.require(MeshHeader::BYTE_SIZE)?;
        let header = MeshHeader::read(&mut reader)?;
        reader.require(header.encoded_size())?;

        let tt = header.num_tri_tex as usize;
        let qt = header.num_quad_tex as usize;
        let tu = header.num_tri_untex as usize;
        let qu = header.num_quad_untex as usize;

        let tri_tex_pos = read_n(&mut reader, 3 * tt, VertexPos::read)?;
        let quad_tex_pos = read_n(&mut reader, 4 * qt, VertexPos::read)?;
        let tri_untex_pos = read_n(&mut reader, 3 * tu, VertexPos::read)?;
        let quad_untex_pos = read_n(&mut reader, 4 * qu, VertexPos::read)?;
        let tri_tex_normals = read_n(&mut reader, 3 * tt, Normal::read)?;
        let quad_tex_normals = read_n(&mut reader, 4 * qt, Normal::read)?;
        let tri_tex_faces = read_n(&mut reader, tt, TriTexFace::read)?;
        let quad_tex_faces = read_n(&mut reader, qt, QuadTexFace::read)?;
        let tri_untex_tags = read_n(&mut reader, tu, |r| r.u32())?;
        let quad_untex_tags = read_n(&mut reader, qu, |r| r.u32())?;
        let tri_tex_tiles = read_n(&mut reader, tt, TilePos::read)?;
        let quad_tex_tiles = read_n(&mut reader, qt, TilePos::read)?;
        let footer = reader.rest().to_vec();

        let tri_tex = (0..tt)
            .map(|i| TexPolygon {
                positions: corners(&tri_tex_pos, i),
                normals: corners(&tri_tex_normals, i),
                face: tri_tex_faces[i],
                tile: tri_tex_tiles[i],
                visibility: vis.and_then(|v| v.tri_tex.get(i).copied()),
            })
            .collect();
        let quad_tex = (0..qt)
            .map(|i| TexPolygon {
                positions: corners(&quad_tex_pos, i),
                normals: corners(&quad_tex_normals, i),
                face: quad_tex_faces[i],
                tile: quad_tex_tiles[i],
                visibility: vis.and_then(|v| v.quad_tex.get(i).copied()),
            })
            .collect();
        let tri_untex = (0..tu)
            .map(|i| UntexPolygon {
                positions: corners(&tri_untex_pos, i),
                tag: tri_untex_tags[i],
                visibility: vis.and_then(|v| v.tri_untex.get(i).copied()),
            })
            .collect();
        let quad_untex = (0..qu)
            .map(|i| UntexPolygon {
                positions: corners(&quad_untex_pos, i),
                tag: quad_untex_tags[i],
                visibility: vis.and_then(|v| v.quad_untex.get(i).copied()),
            })
            .collect();

        let mut mesh = Self {
            tri_tex,
            quad_tex,
            tri_untex,
            quad_untex,
            footer,
            bounds: None,
        };
        mesh.recompute_bounds();
        Ok(mesh)
    }

    pub fn header(&self) -> Result<MeshHeader> {
        let count = |kind: &'static str, n: usize| -> Result<u16> {
            u16::try_from(n).map_err(|_| {
                ResError::TooManyPolygons {
                    kind,
                    count: n,
                    capacity: u16::MAX as usize,
                }
                .into()
            })
        };
        Ok(MeshHeader {
            num_tri_tex: count("textured triangle", self.tri_tex.len())?,
            num_quad_tex: count("textured quad", self.quad_tex.len())?,
            num_tri_untex: count("untextured triangle", self.tri_untex.len())?,
            num_quad_untex: count("untextured quad", self.quad_untex.len())?,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = self.header()?;
        let mut out = Vec::with_capacity(header.encoded_size() + self.footer.len());
        header.write(&mut out)?;
        for p in self.positions() {
            p.write(&mut out)?;
        }
        for n in self
            .tri_tex
            .iter()
            .flat_map(|p| p.normals.iter())
            .chain(self.quad_tex.iter().flat_map(|p| p.normals.iter()))
        {
            n.write(&mut out)?;
        }
        for p in &self.tri_tex {
            p.face.write(&mut out);
        }
        for p in &self.quad_tex {
            p.face.write(&mut out);
        }
        for tag in self
            .tri_untex
            .iter()
            .map(|p| p.tag)
            .chain(self.quad_untex.iter().map(|p| p.tag))
        {
            out.write_u32::<LittleEndian>(tag)?;
        }
        for p in &self.tri_tex {
            p.tile.write(&mut out);
        }
        for p in &self.quad_tex {
            p.tile.write(&mut out);
        }
        out.extend_from_slice(&self.footer);
        Ok(out)
    }

    /// Every vertex position in file order.
    pub fn positions(&self) -> impl Iterator<Item = &VertexPos> + '_ {
        self.tri_tex
            .iter()
            .flat_map(|p| p.positions.iter())
            .chain(self.quad_tex.iter().flat_map(|p| p.positions.iter()))
            .chain(self.tri_untex.iter().flat_map(|p| p.positions.iter()))
            .chain(self.quad_untex.iter().flat_map(|p| p.positions.iter()))
    }

    pub fn tri_tex_positions(&self) -> Vec<VertexPos> {
        self.tri_tex.iter().flat_map(|p| p.positions).collect()
    }

    pub fn quad_tex_positions(&self) -> Vec<VertexPos> {
        self.quad_tex.iter().flat_map(|p| p.positions).collect()
    }

    pub fn tri_untex_positions(&self) -> Vec<VertexPos> {
        self.tri_untex.iter().flat_map(|p| p.positions).collect()
    }

    pub fn quad_untex_positions(&self) -> Vec<VertexPos> {
        self.quad_untex.iter().flat_map(|p| p.positions).collect()
    }

    /// Axis aligned bounds of all vertex positions, as of the last decode or
    /// `recompute_bounds`. None for a mesh without polygons.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn center(&self) -> Option<[f32; 3]> {
        self.bounds.map(|b| b.center())
    }

    pub fn recompute_bounds(&mut self) {
        self.bounds = Bounds::from_positions(self.positions());
    }

    pub fn polygon_count(&self) -> usize {
        self.tri_tex.len() + self.quad_tex.len() + self.tri_untex.len() + self.quad_untex.len()
    }
}
