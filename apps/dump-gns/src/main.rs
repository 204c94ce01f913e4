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
use anyhow::Result;
use gns::{BlobData, GnsMap, MapState};
use humansize::{format_size, BINARY};
use res::{AnimEntry, Chunk, ChunkKind, ResourceFile};
use std::{fs, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "dump-gns")]
/// Show the records, resources and map states of Final Fantasy Tactics GNS maps
struct Opts {
    #[structopt(short = "x", long = "hex")]
    /// Print numbers in hexadecimal
    hex: bool,

    #[structopt(short = "v", long = "verbose")]
    /// Describe every chunk of every resource file
    verbose: bool,

    #[structopt(short = "s", long = "state")]
    /// Resolve this map state, given as arrangement,night,weather
    state: Option<MapState>,

    #[structopt(short = "d", long = "dir", parse(from_os_str))]
    /// Dump every GNS file in this directory
    dir: Option<PathBuf>,

    #[structopt(parse(from_os_str))]
    /// GNS files to dump
    inputs: Vec<PathBuf>,
}

struct Fmt {
    hex: bool,
}

impl Fmt {
    fn num<T: Into<u64>>(&self, v: T) -> String {
        let v = v.into();
        if self.hex {
            format!("0x{:X}", v)
        } else {
            v.to_string()
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::from_args();
    let fmt = Fmt { hex: opts.hex };

    let mut inputs = opts.inputs.clone();
    if let Some(dir) = &opts.dir {
        let mut found = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_gns = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("gns"))
                .unwrap_or(false);
            if is_gns {
                found.push(path);
            }
        }
        found.sort();
        inputs.extend(found);
    }

    for (i, input) in inputs.iter().enumerate() {
        if i != 0 {
            println!();
        }
        let map = GnsMap::open(input)?;
        println!("{}:", input.display());
        show_records(&map, &fmt);
        if opts.verbose {
            show_chunks(&map, &fmt);
        }
        match opts.state {
            Some(state) => show_snapshot(&map, state),
            None => show_states(&map),
        }
    }

    Ok(())
}

fn show_records(map: &GnsMap, fmt: &Fmt) {
    for record in map.index().records() {
        let filename = map
            .index()
            .filename_for_sector(record.sector)
            .unwrap_or("?");
        let size = map
            .blob(record.sector)
            .map(|blob| format_size(blob.len as u64, BINARY))
            .unwrap_or_else(|| "-".to_owned());
        let contents = match map.blob(record.sector).map(|blob| &blob.data) {
            Some(BlobData::Texture(_)) => "texture".to_owned(),
            Some(BlobData::Resource(resource)) => format!(
                "chunks [{}]",
                resource
                    .indices()
                    .map(|i| format!("{:02X}", i))
                    .collect::<Vec<String>>()
                    .join(" ")
            ),
            Some(BlobData::Unknown(_)) | None => "unknown".to_owned(),
        };
        println!(
            "  {:12} {:12} sig={} state={} flag={} sector={} size={} unk03={} unk06={} unk10={} {:>10}  {}",
            filename,
            record.resource_type.name(),
            fmt.num(record.sig),
            record.map_state(),
            fmt.num(record.resource_flag),
            fmt.num(record.sector),
            fmt.num(record.size),
            fmt.num(record.unk03),
            fmt.num(record.unk06),
            fmt.num(record.unk10),
            size,
            contents
        );
    }
}

fn show_chunks(map: &GnsMap, fmt: &Fmt) {
    for blob in map.blobs() {
        if let BlobData::Resource(resource) = &blob.data {
            println!("  {} ({} sectors):", blob.filename, resource.num_sectors());
            show_resource(resource, fmt);
        }
    }
}

fn show_resource(resource: &ResourceFile, fmt: &Fmt) {
    for (index, chunk) in resource.chunks() {
        let kind = ChunkKind::from_index(index).name();
        let detail = match chunk {
            Chunk::Mesh(mesh) => {
                let bounds = mesh
                    .bounds()
                    .map(|b| format!("{:?}..{:?}", b.min, b.max))
                    .unwrap_or_else(|| "empty".to_owned());
                format!(
                    "{} tex tris, {} tex quads, {} untex tris, {} untex quads, bounds {}",
                    mesh.tri_tex.len(),
                    mesh.quad_tex.len(),
                    mesh.tri_untex.len(),
                    mesh.quad_untex.len(),
                    bounds
                )
            }
            Chunk::ColorPalettes(pal) | Chunk::GrayPalettes(pal) | Chunk::PalAnims(pal) => {
                let first = pal
                    .palette(0)
                    .into_iter()
                    .flatten()
                    .map(|c| format!("{:04X}", c.to_word()))
                    .collect::<Vec<String>>()
                    .join(" ");
                format!("palette 0: {}", first)
            }
            Chunk::Lights(lights) => format!(
                "colors {:?}, ambient {:?}, background {:?}",
                (0..3).filter_map(|i| lights.colors.color(i)).collect::<Vec<_>>(),
                lights.ambient,
                lights.background
            ),
            Chunk::Tiles(tiles) => format!(
                "{}x{} grid, {} tiles",
                tiles.size_x,
                tiles.size_z,
                tiles.tiles().count()
            ),
            Chunk::TexAnims(anims) => {
                let (mut tex, mut pal) = (0, 0);
                for (_, entry) in anims.active() {
                    match entry {
                        AnimEntry::Texture(_) => tex += 1,
                        AnimEntry::Palette(_) => pal += 1,
                    }
                }
                format!("{} texture and {} palette animations", tex, pal)
            }
            Chunk::VisAngles(vis) => {
                let used = vis
                    .tri_tex
                    .iter()
                    .chain(vis.quad_tex.iter())
                    .chain(vis.tri_untex.iter())
                    .chain(vis.quad_untex.iter())
                    .filter(|&&v| v != 0)
                    .count();
                format!("{} populated slots", used)
            }
            Chunk::Opaque(data) => format!("{} opaque bytes", data.len()),
        };
        println!(
            "    {} {:20} {}",
            fmt.num(index as u64),
            kind,
            detail
        );
    }
}

fn show_states(map: &GnsMap) {
    let default = map.default_state();
    println!("  map states (arrangement,night,weather):");
    for state in map.all_map_states() {
        let marker = if *state == default { "*" } else { " " };
        println!("  {} {}", marker, state);
    }
}

fn show_snapshot(map: &GnsMap, state: MapState) {
    if !map.index().has_state(state) {
        println!("  state {} is not used by this map; fallbacks only", state);
    }
    let snapshot = map.snapshot(state);
    println!("  state {}:", snapshot.state);
    println!("    resources: {}", snapshot.resources.join(" "));
    println!(
        "    textures:  {}",
        snapshot
            .textures
            .iter()
            .map(|t| t.filename)
            .collect::<Vec<&str>>()
            .join(" ")
    );
    let from = |filename: Option<&str>| filename.unwrap_or("-").to_owned();
    println!("    mesh:           {}", from(snapshot.mesh.map(|r| r.filename)));
    println!(
        "    color palettes: {}",
        from(snapshot.color_palettes.map(|r| r.filename))
    );
    println!(
        "    gray palettes:  {}",
        from(snapshot.gray_palettes.map(|r| r.filename))
    );
    println!("    lights:         {}", from(snapshot.lights.map(|r| r.filename)));
    println!("    tiles:          {}", from(snapshot.tiles.map(|r| r.filename)));
    println!(
        "    tex anims:      {}",
        from(snapshot.tex_anims.map(|r| r.filename))
    );
    println!(
        "    pal anims:      {}",
        from(snapshot.pal_anims.map(|r| r.filename))
    );
    match snapshot.bounds() {
        Some(bounds) => println!(
            "    bounds: {:?}..{:?} center {:?}",
            bounds.min,
            bounds.max,
            bounds.center()
        ),
        None => println!("    bounds: no mesh"),
    }
}
