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

// A GNS file is the directory of one battle map. It lists the resources the
// map is built from, each tagged with the map state (arrangement, time of day
// and weather) it belongs to, but refers to them only by disc sector. The
// resources themselves sit next to it as MAPxxx.<n> files.
mod directory;
mod index;
mod map;
mod record;

pub use crate::{
    directory::Directory,
    index::{resource_number, MapIndex, Selection},
    map::{Blob, BlobData, GnsMap, MapSnapshot, Resolved},
    record::{GnsRecord, MapState, ResourceType},
};

use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum GnsError {
    #[error("directory ends at byte {offset} without an EOF record ({records} records read)")]
    TruncatedDirectory { offset: usize, records: usize },
    #[error("{sectors} distinct record sectors but {files} resource files")]
    RecordFileCountMismatch { sectors: usize, files: usize },
    #[error("no mesh resources, so no map states")]
    NoMapStatesFound,
    #[error("resource file name '{name}' has no numeric extension")]
    BadResourceName { name: String },
}
