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
// Chunk 0x1B: a fixed table of 32 animation slots, 20 bytes each. A slot
// either animates a rectangle of the texture by copying frames in from
// elsewhere on the page, or cycles one of the map's palettes through the
// colors stored in chunk 0x1C. Both layouts share the signature byte and the
// frame count/length tail; a palette slot has a signature of 0 and 0x01E0 in
// the word a texture slot keeps its `y` in.
use crate::{reader::ChunkReader, CHUNK_TEX_ANIMS};
use anyhow::Result;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

const ENTRY_COUNT: usize = 32;
const X_BITS: u32 = 6;
const X_MASK: u8 = (1 << X_BITS) - 1;

/// Texture rectangles are addressed in units of 4 pixels horizontally.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TexAnim {
    pub x_over_4: u8,
    pub tex_page: u8,
    pub struct_sig: u8,
    pub y: u16,
    pub width_over_4: u16,
    pub height: u16,
    pub first_x_over_4: u8,
    pub first_tex_page: u8,
    pub first_must_be_3: u8,
    pub first_y: u16,
    pub unk_c: u16,
    /// 0x01 loop forward, 0x02 ping-pong, 0x05/0x15 forward/reverse on use.
    pub anim_type: u8,
    pub num_frames: u8,
    pub unk10: u8,
    pub frame_len_in_30hz: u8,
    pub unk12: u16,
}

impl TexAnim {
    fn from_entry(b: &[u8]) -> Self {
        Self {
            x_over_4: b[0] & X_MASK,
            tex_page: b[0] >> X_BITS,
            struct_sig: b[1],
            y: LittleEndian::read_u16(&b[2..]),
            width_over_4: LittleEndian::read_u16(&b[4..]),
            height: LittleEndian::read_u16(&b[6..]),
            first_x_over_4: b[8] & X_MASK,
            first_tex_page: b[8] >> X_BITS,
            first_must_be_3: b[9],
            first_y: LittleEndian::read_u16(&b[10..]),
            unk_c: LittleEndian::read_u16(&b[12..]),
            anim_type: b[14],
            num_frames: b[15],
            unk10: b[16],
            frame_len_in_30hz: b[17],
            unk12: LittleEndian::read_u16(&b[18..]),
        }
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push((self.x_over_4 & X_MASK) | (self.tex_page << X_BITS));
        out.push(self.struct_sig);
        out.write_u16::<LittleEndian>(self.y)?;
        out.write_u16::<LittleEndian>(self.width_over_4)?;
        out.write_u16::<LittleEndian>(self.height)?;
        out.push((self.first_x_over_4 & X_MASK) | (self.first_tex_page << X_BITS));
        out.push(self.first_must_be_3);
        out.write_u16::<LittleEndian>(self.first_y)?;
        out.write_u16::<LittleEndian>(self.unk_c)?;
        out.extend_from_slice(&[
            self.anim_type,
            self.num_frames,
            self.unk10,
            self.frame_len_in_30hz,
        ]);
        out.write_u16::<LittleEndian>(self.unk12)?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PalAnim {
    pub palette: u8,
    pub unk0_4: u8,
    pub struct_sig: u8,
    pub unk2: u16,
    pub unk4: u32,
    /// First palette of the cycle within chunk 0x1C.
    pub start_index: u8,
    pub unk9: [u8; 5],
    pub unk_e: u8,
    pub num_frames: u8,
    pub unk10: u8,
    pub frame_len_in_30hz: u8,
    pub unk12: u16,
}

impl PalAnim {
    const PALETTE_BITS: u32 = 4;
    const PALETTE_MASK: u8 = (1 << Self::PALETTE_BITS) - 1;

    fn from_entry(b: &[u8]) -> Self {
        let mut unk9 = [0u8; 5];
        unk9.copy_from_slice(&b[9..14]);
        Self {
            palette: b[0] & Self::PALETTE_MASK,
            unk0_4: b[0] >> Self::PALETTE_BITS,
            struct_sig: b[1],
            unk2: LittleEndian::read_u16(&b[2..]),
            unk4: LittleEndian::read_u32(&b[4..]),
            start_index: b[8],
            unk9,
            unk_e: b[14],
            num_frames: b[15],
            unk10: b[16],
            frame_len_in_30hz: b[17],
            unk12: LittleEndian::read_u16(&b[18..]),
        }
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push((self.palette & Self::PALETTE_MASK) | (self.unk0_4 << Self::PALETTE_BITS));
        out.push(self.struct_sig);
        out.write_u16::<LittleEndian>(self.unk2)?;
        out.write_u32::<LittleEndian>(self.unk4)?;
        out.push(self.start_index);
        out.extend_from_slice(&self.unk9);
        out.extend_from_slice(&[
            self.unk_e,
            self.num_frames,
            self.unk10,
            self.frame_len_in_30hz,
        ]);
        out.write_u16::<LittleEndian>(self.unk12)?;
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AnimEntry {
    Texture(TexAnim),
    Palette(PalAnim),
}

impl AnimEntry {
    pub const BYTE_SIZE: usize = 20;
    const PALETTE_MARKER: u16 = 0x01E0;

    fn from_entry(b: &[u8]) -> Self {
        if b[1] == 0 && LittleEndian::read_u16(&b[2..]) == Self::PALETTE_MARKER {
            AnimEntry::Palette(PalAnim::from_entry(b))
        } else {
            AnimEntry::Texture(TexAnim::from_entry(b))
        }
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            AnimEntry::Texture(anim) => anim.write(out),
            AnimEntry::Palette(anim) => anim.write(out),
        }
    }

    pub fn num_frames(&self) -> u8 {
        match self {
            AnimEntry::Texture(anim) => anim.num_frames,
            AnimEntry::Palette(anim) => anim.num_frames,
        }
    }

    /// Unused slots are all zero.
    pub fn is_empty(&self) -> bool {
        matches!(self, AnimEntry::Texture(anim) if *anim == TexAnim::default())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TexAnimChunk {
    pub entries: [AnimEntry; ENTRY_COUNT],
    pub footer: Vec<u8>,
}

impl TexAnimChunk {
    pub const ENTRY_COUNT: usize = ENTRY_COUNT;
    pub const BYTE_SIZE: usize = Self::ENTRY_COUNT * AnimEntry::BYTE_SIZE;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = ChunkReader::new(CHUNK_TEX_ANIMS, data);
        reader.require(Self::BYTE_SIZE)?;
        let mut entries = [AnimEntry::Texture(TexAnim::default()); Self::ENTRY_COUNT];
        for entry in entries.iter_mut() {
            *entry = AnimEntry::from_entry(reader.take(AnimEntry::BYTE_SIZE)?);
        }
        Ok(Self {
            entries,
            footer: reader.rest().to_vec(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(Self::BYTE_SIZE + self.footer.len());
        for entry in &self.entries {
            entry.write(&mut out)?;
        }
        out.extend_from_slice(&self.footer);
        Ok(out)
    }

    pub fn active(&self) -> impl Iterator<Item = (usize, &AnimEntry)> + '_ {
        self.entries.iter().enumerate().filter(|(_, e)| !e.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResError;

    fn sample() -> Vec<u8> {
        let mut data = vec![0u8; TexAnimChunk::BYTE_SIZE];
        // slot 0: texture page 2, x 0x25, looping 8 frames
        data[..20].copy_from_slice(&[
            0xA5, 0x03, 0x00, 0x01, 0x08, 0x00, 0x20, 0x00, 0x4A, 0x03, 0x40, 0x02, 0x00, 0x00,
            0x01, 0x08, 0x00, 0x04, 0x00, 0x00,
        ]);
        // slot 3: cycles palette 9 starting at index 4
        data[60..80].copy_from_slice(&[
            0x79, 0x00, 0xE0, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 1, 2, 3, 4, 5, 0x03, 0x06,
            0x00, 0x02, 0x34, 0x12,
        ]);
        data
    }

    #[test]
    fn it_splits_texture_and_palette_entries() -> Result<()> {
        let chunk = TexAnimChunk::from_bytes(&sample())?;
        match chunk.entries[0] {
            AnimEntry::Texture(anim) => {
                assert_eq!(anim.x_over_4, 0x25);
                assert_eq!(anim.tex_page, 2);
                assert_eq!(anim.y, 0x0100);
                assert_eq!(anim.width_over_4, 8);
                assert_eq!(anim.height, 32);
                assert_eq!(anim.first_x_over_4, 0x0A);
                assert_eq!(anim.first_tex_page, 1);
                assert_eq!(anim.first_must_be_3, 3);
                assert_eq!(anim.first_y, 0x0240);
                assert_eq!(anim.anim_type, 1);
                assert_eq!(anim.frame_len_in_30hz, 4);
            }
            AnimEntry::Palette(_) => panic!("expected a texture animation"),
        }
        match chunk.entries[3] {
            AnimEntry::Palette(anim) => {
                assert_eq!(anim.palette, 9);
                assert_eq!(anim.unk0_4, 7);
                assert_eq!(anim.start_index, 4);
                assert_eq!(anim.unk9, [1, 2, 3, 4, 5]);
                assert_eq!(anim.unk_e, 3);
                assert_eq!(anim.num_frames, 6);
                assert_eq!(anim.unk12, 0x1234);
            }
            AnimEntry::Texture(_) => panic!("expected a palette animation"),
        }
        assert_eq!(
            chunk.active().map(|(i, _)| i).collect::<Vec<usize>>(),
            vec![0, 3]
        );
        Ok(())
    }

    #[test]
    fn it_writes_what_it_read() -> Result<()> {
        let mut data = sample();
        data.extend_from_slice(&[1, 2, 3]);
        let chunk = TexAnimChunk::from_bytes(&data)?;
        assert_eq!(chunk.footer, vec![1, 2, 3]);
        assert_eq!(chunk.to_bytes()?, data);
        Ok(())
    }

    #[test]
    fn it_rejects_short_tables() {
        let err = TexAnimChunk::from_bytes(&[0u8; 600]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ResError>(),
            Some(&ResError::ChunkTruncated {
                index: CHUNK_TEX_ANIMS,
                expected: 640,
                actual: 600
            })
        );
    }
}
