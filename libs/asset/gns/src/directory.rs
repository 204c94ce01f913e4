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
use crate::{
    record::{GnsRecord, ResourceType},
    GnsError,
};
use anyhow::Result;
use log::trace;

// Smallest tail that still holds the flag and type bytes of a terminator.
const MIN_TAIL: usize = 6;

/// The records of a GNS file in file order, plus the terminator that closed
/// them. The terminator is often cut short to 8 bytes; its original length
/// and anything stored after it are kept so the file can be written back as
/// it was read.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Directory {
    records: Vec<GnsRecord>,
    terminator: GnsRecord,
    terminator_len: usize,
    trailing: Vec<u8>,
}

impl Directory {
    pub fn new(records: Vec<GnsRecord>) -> Self {
        Self {
            records,
            terminator: GnsRecord::eof(),
            terminator_len: GnsRecord::EOF_BYTE_SIZE,
            trailing: Vec::new(),
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let remaining = data.len() - offset;
            if remaining < MIN_TAIL {
                return Err(GnsError::TruncatedDirectory {
                    offset,
                    records: records.len(),
                }
                .into());
            }
            // A short tail is zero padded out to a full record.
            let take = remaining.min(GnsRecord::BYTE_SIZE);
            let mut buf = [0u8; GnsRecord::BYTE_SIZE];
            buf[..take].copy_from_slice(&data[offset..offset + take]);
            let record = GnsRecord::from_bytes(&buf);

            if record.is_eof() {
                if records.is_empty() {
                    return Err(GnsError::TruncatedDirectory { offset, records: 0 }.into());
                }
                return Ok(Self {
                    records,
                    terminator: record,
                    terminator_len: take,
                    trailing: data[offset + take..].to_vec(),
                });
            }
            if take < GnsRecord::BYTE_SIZE {
                return Err(GnsError::TruncatedDirectory {
                    offset,
                    records: records.len(),
                }
                .into());
            }
            trace!(
                "record {} at {}: {} sector {}",
                records.len(),
                offset,
                record.resource_type.name(),
                record.sector
            );
            records.push(record);
            offset += GnsRecord::BYTE_SIZE;
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.records.len() * GnsRecord::BYTE_SIZE + self.terminator_len + self.trailing.len(),
        );
        for record in &self.records {
            out.extend_from_slice(&record.to_bytes());
        }
        let len = self.terminator_len.clamp(MIN_TAIL, GnsRecord::BYTE_SIZE);
        out.extend_from_slice(&self.terminator.to_bytes()[..len]);
        out.extend_from_slice(&self.trailing);
        out
    }

    /// Records in file order, terminator excluded.
    pub fn records(&self) -> &[GnsRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut Vec<GnsRecord> {
        &mut self.records
    }

    pub fn terminator_len(&self) -> usize {
        self.terminator_len
    }

    pub fn count(&self, kind: ResourceType) -> usize {
        self.records
            .iter()
            .filter(|r| r.resource_type == kind)
            .count()
    }
}
