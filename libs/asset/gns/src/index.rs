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
    record::{GnsRecord, MapState, ResourceType},
    GnsError,
};
use anyhow::Result;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

/// Resource files are named after their GNS file with a decimal extension,
/// e.g. MAP001.8 or MAP001.48.
pub fn resource_number(filename: &str) -> Result<u32> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse::<u32>().ok())
        .ok_or_else(|| {
            GnsError::BadResourceName {
                name: filename.to_owned(),
            }
            .into()
        })
}

/// Which records make up one map state, as indices into `MapIndex::records`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Selection {
    pub non_texture: Vec<usize>,
    pub texture: Vec<usize>,
}

/// Ties a directory's records to the resource files next to it.
///
/// The directory never names files. Instead, the distinct sectors of the
/// records, in ascending order, line up one to one with the resource files
/// sorted by their numeric extension.
#[derive(Clone, Debug)]
pub struct MapIndex {
    records: Vec<GnsRecord>,
    filename_for_sector: BTreeMap<u32, String>,
    all_map_states: Vec<MapState>,
}

impl MapIndex {
    pub fn new(records: &[GnsRecord], filenames: &[String]) -> Result<Self> {
        let mut numbered = filenames
            .iter()
            .map(|name| Ok((resource_number(name)?, name.to_owned())))
            .collect::<Result<Vec<(u32, String)>>>()?;
        numbered.sort_by_key(|(number, _)| *number);

        let sectors = records.iter().map(|r| r.sector).collect::<BTreeSet<u32>>();
        if sectors.len() != numbered.len() {
            return Err(GnsError::RecordFileCountMismatch {
                sectors: sectors.len(),
                files: numbered.len(),
            }
            .into());
        }
        let filename_for_sector = sectors
            .into_iter()
            .zip(numbered.into_iter().map(|(_, name)| name))
            .collect::<BTreeMap<u32, String>>();

        let mut sorted = records.to_vec();
        sorted.sort_by_key(|r| r.sector);

        let all_map_states = sorted
            .iter()
            .filter(|r| r.resource_type.is_mesh())
            .map(|r| r.map_state())
            .collect::<BTreeSet<MapState>>()
            .into_iter()
            .collect::<Vec<MapState>>();
        if all_map_states.is_empty() {
            return Err(GnsError::NoMapStatesFound.into());
        }

        Ok(Self {
            records: sorted,
            filename_for_sector,
            all_map_states,
        })
    }

    /// Records ordered by sector. Records sharing a sector keep file order.
    pub fn records(&self) -> &[GnsRecord] {
        &self.records
    }

    pub fn filename_for_sector(&self, sector: u32) -> Option<&str> {
        self.filename_for_sector.get(&sector).map(String::as_str)
    }

    pub fn sector_for_filename(&self, filename: &str) -> Option<u32> {
        self.filename_for_sector
            .iter()
            .find(|(_, name)| name.as_str() == filename)
            .map(|(&sector, _)| sector)
    }

    /// Filenames in sector order.
    pub fn filenames(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.filename_for_sector
            .iter()
            .map(|(&sector, name)| (sector, name.as_str()))
    }

    /// Every state a mesh resource is tagged with, ascending.
    pub fn all_map_states(&self) -> &[MapState] {
        &self.all_map_states
    }

    pub fn default_state(&self) -> MapState {
        self.all_map_states[0]
    }

    pub fn has_state(&self, state: MapState) -> bool {
        self.all_map_states.binary_search(&state).is_ok()
    }

    /// Mesh resources tagged with `state` plus every initial mesh, and
    /// textures tagged with `state` plus the first texture. Both lists are in
    /// sector order, which is the order fields are resolved in: the first
    /// resource to supply a field wins. A state no record carries selects only
    /// the fallbacks.
    pub fn select(&self, state: MapState) -> Selection {
        let mut out = Selection::default();
        let mut textures_seen = 0;
        for (i, record) in self.records.iter().enumerate() {
            match record.resource_type {
                ResourceType::Texture => {
                    if record.map_state() == state || textures_seen == 0 {
                        out.texture.push(i);
                    }
                    textures_seen += 1;
                }
                kind if kind.is_mesh() => {
                    if record.map_state() == state || kind == ResourceType::MeshInit {
                        out.non_texture.push(i);
                    }
                }
                _ => {}
            }
        }
        out
    }
}
