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
use anyhow::{Context, Result};
use gns::GnsMap;
use log::info;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "pack-gns")]
/// Re-encode a Final Fantasy Tactics GNS map and all of its resource files
struct Opts {
    #[structopt(short = "-o", long = "--output", parse(from_os_str))]
    /// Write the packed map into this directory
    output: PathBuf,

    #[structopt(parse(from_os_str))]
    /// The GNS file to pack
    input: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let opts = Opts::from_args();
    let mut map = GnsMap::open(&opts.input)?;
    info!(
        "{}: {} records, {} map states",
        map.name(),
        map.directory().records().len(),
        map.all_map_states().len()
    );
    map.save(&opts.output)
        .with_context(|| format!("packing {} into {}", opts.input.display(), opts.output.display()))?;
    Ok(())
}
