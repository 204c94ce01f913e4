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
    directory::Directory,
    index::{MapIndex, Selection},
    record::{GnsRecord, MapState, ResourceType},
};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use res::{
    count_sectors, Bounds, LightChunk, MeshChunk, PaletteChunk, ResourceFile, TexAnimChunk,
    TileChunk, SECTOR_SIZE,
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tex::Texture;

#[derive(Clone, Debug, PartialEq)]
pub enum BlobData {
    Texture(Texture),
    Resource(ResourceFile),
    Unknown(Vec<u8>),
}

impl BlobData {
    pub fn from_bytes(kind: ResourceType, data: &[u8]) -> Result<Self> {
        Ok(match kind {
            ResourceType::Texture => BlobData::Texture(Texture::from_bytes(data)?),
            kind if kind.is_mesh() => BlobData::Resource(ResourceFile::from_bytes(data)?),
            _ => BlobData::Unknown(data.to_vec()),
        })
    }

    /// Re-encode. Resources also note any change in their sector count.
    pub fn encode(&mut self) -> Result<Vec<u8>> {
        Ok(match self {
            BlobData::Texture(texture) => texture.to_bytes(),
            BlobData::Resource(resource) => resource.encode()?,
            BlobData::Unknown(data) => data.clone(),
        })
    }

    pub fn resource(&self) -> Option<&ResourceFile> {
        match self {
            BlobData::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn texture(&self) -> Option<&Texture> {
        match self {
            BlobData::Texture(texture) => Some(texture),
            _ => None,
        }
    }
}

/// One decoded resource file.
#[derive(Clone, Debug, PartialEq)]
pub struct Blob {
    pub filename: String,
    pub record: GnsRecord,
    /// Byte length of the file as last read or encoded.
    pub len: usize,
    pub data: BlobData,
}

/// A value picked out of the selected resources, and the file it came from.
#[derive(Debug)]
pub struct Resolved<'a, T> {
    pub filename: &'a str,
    pub value: &'a T,
}

impl<'a, T> Clone for Resolved<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Resolved<'a, T> {}

/// Everything a scene needs for one map state. Each chunk kind comes from the
/// first selected resource that has one.
#[derive(Clone, Debug)]
pub struct MapSnapshot<'a> {
    pub state: MapState,
    pub resources: Vec<&'a str>,
    pub textures: Vec<Resolved<'a, Texture>>,
    pub mesh: Option<Resolved<'a, MeshChunk>>,
    pub color_palettes: Option<Resolved<'a, PaletteChunk>>,
    pub gray_palettes: Option<Resolved<'a, PaletteChunk>>,
    pub lights: Option<Resolved<'a, LightChunk>>,
    pub tiles: Option<Resolved<'a, TileChunk>>,
    pub tex_anims: Option<Resolved<'a, TexAnimChunk>>,
    pub pal_anims: Option<Resolved<'a, PaletteChunk>>,
}

impl<'a> MapSnapshot<'a> {
    pub fn bounds(&self) -> Option<Bounds> {
        self.mesh.and_then(|mesh| mesh.value.bounds())
    }

    pub fn center(&self) -> Option<[f32; 3]> {
        self.bounds().map(|b| b.center())
    }
}

fn first<'a, T>(
    layers: &[(&'a str, &'a ResourceFile)],
    get: impl Fn(&'a ResourceFile) -> Option<&'a T>,
) -> Option<Resolved<'a, T>> {
    layers.iter().find_map(|&(filename, resource)| {
        get(resource).map(|value| Resolved { filename, value })
    })
}

/// A GNS directory and every resource file it refers to, fully decoded.
#[derive(Clone, Debug)]
pub struct GnsMap {
    name: String,
    directory: Directory,
    index: MapIndex,
    blobs: BTreeMap<u32, Blob>,
}

impl GnsMap {
    /// Load `path` and the resource files that share its stem from the same
    /// directory.
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("no file name in {}", path.display()))?
            .to_owned();
        let stem = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_owned(),
            _ => PathBuf::from("."),
        };
        let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

        let mut files = Vec::new();
        for entry in fs::read_dir(&parent)
            .with_context(|| format!("listing {}", parent.display()))?
        {
            let entry = entry?;
            let filename = match entry.file_name().to_str() {
                Some(s) => s.to_owned(),
                None => continue,
            };
            let entry_path = entry.path();
            let same_stem = entry_path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.eq_ignore_ascii_case(&stem))
                .unwrap_or(false);
            if filename == name || !same_stem || !entry_path.is_file() {
                continue;
            }
            let content = fs::read(&entry_path)
                .with_context(|| format!("reading {}", entry_path.display()))?;
            files.push((filename, content));
        }
        debug!("{}: found {} resource files", name, files.len());

        Self::from_parts(&name, &data, files).with_context(|| format!("loading {}", path.display()))
    }

    /// Build from the GNS bytes and the `(filename, bytes)` of each resource.
    pub fn from_parts(name: &str, gns: &[u8], files: Vec<(String, Vec<u8>)>) -> Result<Self> {
        let directory = Directory::from_bytes(gns)?;
        let filenames = files
            .iter()
            .map(|(filename, _)| filename.clone())
            .collect::<Vec<String>>();
        let index = MapIndex::new(directory.records(), &filenames)?;

        let mut blobs = BTreeMap::new();
        for (filename, content) in files {
            let sector = match index.sector_for_filename(&filename) {
                Some(sector) => sector,
                None => continue,
            };
            // The first record on a sector decides how the file is read.
            let record = match index.records().iter().find(|r| r.sector == sector) {
                Some(record) => *record,
                None => continue,
            };
            let expected = count_sectors(content.len()) * SECTOR_SIZE;
            if record.size as usize != expected {
                warn!(
                    "{}: directory size {} does not match {} bytes on disk ({} rounded to sectors)",
                    filename,
                    record.size,
                    content.len(),
                    expected
                );
            }
            let data = BlobData::from_bytes(record.resource_type, &content).with_context(|| {
                format!(
                    "decoding {} {} ({} bytes)",
                    record.resource_type.name(),
                    filename,
                    content.len()
                )
            })?;
            blobs.insert(
                sector,
                Blob {
                    filename,
                    record,
                    len: content.len(),
                    data,
                },
            );
        }

        Ok(Self {
            name: name.to_owned(),
            directory,
            index,
            blobs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn index(&self) -> &MapIndex {
        &self.index
    }

    pub fn all_map_states(&self) -> &[MapState] {
        self.index.all_map_states()
    }

    pub fn default_state(&self) -> MapState {
        self.index.default_state()
    }

    pub fn blob(&self, sector: u32) -> Option<&Blob> {
        self.blobs.get(&sector)
    }

    pub fn blob_mut(&mut self, sector: u32) -> Option<&mut Blob> {
        self.blobs.get_mut(&sector)
    }

    /// Blobs in sector order.
    pub fn blobs(&self) -> impl Iterator<Item = &Blob> + '_ {
        self.blobs.values()
    }

    pub fn select(&self, state: MapState) -> Selection {
        self.index.select(state)
    }

    pub fn snapshot(&self, state: MapState) -> MapSnapshot<'_> {
        let selection = self.index.select(state);
        let records = self.index.records();
        let blob_for = |i: &usize| self.blobs.get(&records[*i].sector);

        let layers = selection
            .non_texture
            .iter()
            .filter_map(blob_for)
            .filter_map(|blob| {
                blob.data
                    .resource()
                    .map(|resource| (blob.filename.as_str(), resource))
            })
            .collect::<Vec<(&str, &ResourceFile)>>();
        let textures = selection
            .texture
            .iter()
            .filter_map(blob_for)
            .filter_map(|blob| {
                blob.data.texture().map(|value| Resolved {
                    filename: blob.filename.as_str(),
                    value,
                })
            })
            .collect();

        MapSnapshot {
            state,
            resources: layers.iter().map(|(filename, _)| *filename).collect(),
            textures,
            mesh: first(&layers, ResourceFile::mesh),
            color_palettes: first(&layers, ResourceFile::color_palettes),
            gray_palettes: first(&layers, ResourceFile::gray_palettes),
            lights: first(&layers, ResourceFile::lights),
            tiles: first(&layers, ResourceFile::tiles),
            tex_anims: first(&layers, ResourceFile::tex_anims),
            pal_anims: first(&layers, ResourceFile::pal_anims),
        }
    }

    /// Re-encode the directory and every resource as `(filename, bytes)`,
    /// directory first.
    pub fn encode(&mut self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut out = vec![(self.name.clone(), self.directory.to_bytes())];
        for blob in self.blobs.values_mut() {
            let data = blob
                .data
                .encode()
                .with_context(|| format!("encoding {}", blob.filename))?;
            blob.len = data.len();
            out.push((blob.filename.clone(), data));
        }
        Ok(out)
    }

    /// Write the directory and every resource into `out_dir` under their
    /// original names.
    pub fn save(&mut self, out_dir: &Path) -> Result<()> {
        fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
        for (filename, data) in self.encode()? {
            let path = out_dir.join(&filename);
            fs::write(&path, &data).with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {} ({} bytes)", path.display(), data.len());
        }
        Ok(())
    }
}
