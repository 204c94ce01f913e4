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
use crate::ResError;
use anyhow::Result;
use byteorder::{ByteOrder, LittleEndian};

/// Walks a chunk's bytes front to back. Every read is bounds checked against
/// the chunk's declared range and fails with `ChunkTruncated` when short.
pub(crate) struct ChunkReader<'a> {
    index: usize,
    data: &'a [u8],
    offset: usize,
}

impl<'a> ChunkReader<'a> {
    pub(crate) fn new(index: usize, data: &'a [u8]) -> Self {
        Self {
            index,
            data,
            offset: 0,
        }
    }

    /// Fail unless the whole chunk is at least `expected` bytes long.
    pub(crate) fn require(&self, expected: usize) -> Result<()> {
        ensure_len(self.index, expected, self.data.len())
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(self.offset + n)?;
        let out = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub(crate) fn i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// Everything not yet consumed.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.offset.min(self.data.len())..];
        self.offset = self.data.len();
        out
    }
}

pub(crate) fn ensure_len(index: usize, expected: usize, actual: usize) -> Result<()> {
    if actual < expected {
        return Err(ResError::ChunkTruncated {
            index,
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}
