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
use anyhow::{anyhow, bail, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::{fmt, str::FromStr};

#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ResourceType {
    Texture,
    MeshInit,
    MeshReplace,
    MeshAlt,
    Eof,
    Unknown(u8),
}

impl ResourceType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x17 => Self::Texture,
            0x2E => Self::MeshInit,
            0x2F => Self::MeshReplace,
            0x30 => Self::MeshAlt,
            0x31 => Self::Eof,
            v => Self::Unknown(v),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Texture => 0x17,
            Self::MeshInit => 0x2E,
            Self::MeshReplace => 0x2F,
            Self::MeshAlt => 0x30,
            Self::Eof => 0x31,
            Self::Unknown(v) => v,
        }
    }

    /// Resources laid out as a chunk table.
    pub fn is_mesh(self) -> bool {
        matches!(self, Self::MeshInit | Self::MeshReplace | Self::MeshAlt)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Texture => "texture",
            Self::MeshInit => "mesh-init",
            Self::MeshReplace => "mesh-replace",
            Self::MeshAlt => "mesh-alt",
            Self::Eof => "eof",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// One playable configuration of a map. Ordered as the tuple
/// (arrangement, is_night, weather); the smallest state is the default.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MapState {
    pub arrangement: u8,
    pub is_night: bool,
    pub weather: u8,
}

impl MapState {
    pub fn new(arrangement: u8, is_night: bool, weather: u8) -> Self {
        Self {
            arrangement,
            is_night,
            weather,
        }
    }
}

impl fmt::Display for MapState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.arrangement,
            u8::from(self.is_night),
            self.weather
        )
    }
}

impl FromStr for MapState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts = s.split(',').map(str::trim).collect::<Vec<&str>>();
        if parts.len() != 3 {
            bail!("expected a map state as arrangement,night,weather; got '{}'", s);
        }
        let is_night = match parts[1] {
            "0" | "day" => false,
            "1" | "night" => true,
            other => return Err(anyhow!("night must be 0 or 1; got '{}'", other)),
        };
        Ok(Self {
            arrangement: parts[0].parse()?,
            is_night,
            weather: parts[2].parse()?,
        })
    }
}

/// A 20 byte directory entry. The packed byte at offset 3 holds an unknown
/// low nibble, the 3 bit weather and the night flag in the top bit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GnsRecord {
    pub sig: u16,
    pub arrangement: u8,
    pub unk03: u8,
    pub weather: u8,
    pub is_night: bool,
    pub resource_flag: u8,
    pub resource_type: ResourceType,
    /// Nearly always 0x3333.
    pub unk06: u16,
    pub sector: u32,
    /// Bytes, rounded up to whole sectors.
    pub size: u32,
    /// Nearly always 0x88776655.
    pub unk10: u32,
}

impl GnsRecord {
    pub const BYTE_SIZE: usize = 20;
    pub const EOF_BYTE_SIZE: usize = 8;

    const UNK03_MASK: u8 = 0x0F;
    const WEATHER_SHIFT: u32 = 4;
    const WEATHER_MASK: u8 = 0x07;
    const NIGHT_BIT: u8 = 0x80;

    /// The terminator written after the last record.
    pub fn eof() -> Self {
        Self {
            sig: 0,
            arrangement: 0,
            unk03: 0,
            weather: 0,
            is_night: false,
            resource_flag: 1,
            resource_type: ResourceType::Eof,
            unk06: 0,
            sector: 0,
            size: 0,
            unk10: 0,
        }
    }

    pub fn from_bytes(b: &[u8; Self::BYTE_SIZE]) -> Self {
        Self {
            sig: LittleEndian::read_u16(&b[0..]),
            arrangement: b[2],
            unk03: b[3] & Self::UNK03_MASK,
            weather: (b[3] >> Self::WEATHER_SHIFT) & Self::WEATHER_MASK,
            is_night: b[3] & Self::NIGHT_BIT != 0,
            resource_flag: b[4],
            resource_type: ResourceType::from_byte(b[5]),
            unk06: LittleEndian::read_u16(&b[6..]),
            sector: LittleEndian::read_u32(&b[8..]),
            size: LittleEndian::read_u32(&b[12..]),
            unk10: LittleEndian::read_u32(&b[16..]),
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::BYTE_SIZE] {
        let mut b = [0u8; Self::BYTE_SIZE];
        LittleEndian::write_u16(&mut b[0..], self.sig);
        b[2] = self.arrangement;
        b[3] = (self.unk03 & Self::UNK03_MASK)
            | ((self.weather & Self::WEATHER_MASK) << Self::WEATHER_SHIFT);
        if self.is_night {
            b[3] |= Self::NIGHT_BIT;
        }
        b[4] = self.resource_flag;
        b[5] = self.resource_type.to_byte();
        LittleEndian::write_u16(&mut b[6..], self.unk06);
        LittleEndian::write_u32(&mut b[8..], self.sector);
        LittleEndian::write_u32(&mut b[12..], self.size);
        LittleEndian::write_u32(&mut b[16..], self.unk10);
        b
    }

    pub fn is_eof(&self) -> bool {
        self.resource_flag == 1 && self.resource_type == ResourceType::Eof
    }

    pub fn map_state(&self) -> MapState {
        MapState {
            arrangement: self.arrangement,
            is_night: self.is_night,
            weather: self.weather,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_unpacks_the_state_byte() {
        let mut data = [0u8; GnsRecord::BYTE_SIZE];
        data[..8].copy_from_slice(&[0x22, 0x00, 0x01, 0xB5, 0x01, 0x30, 0x33, 0x33]);
        data[8..12].copy_from_slice(&10u32.to_le_bytes());
        data[12..16].copy_from_slice(&0x800u32.to_le_bytes());
        data[16..].copy_from_slice(&0x8877_6655u32.to_le_bytes());
        let record = GnsRecord::from_bytes(&data);
        assert_eq!(record.sig, 0x22);
        assert_eq!(record.arrangement, 1);
        assert_eq!(record.unk03, 5);
        assert_eq!(record.weather, 3);
        assert!(record.is_night);
        assert_eq!(record.resource_type, ResourceType::MeshAlt);
        assert_eq!(record.unk06, 0x3333);
        assert_eq!(record.sector, 10);
        assert_eq!(record.size, 0x800);
        assert_eq!(record.unk10, 0x8877_6655);
        assert_eq!(record.map_state(), MapState::new(1, true, 3));
        assert_eq!(record.to_bytes(), data);
    }

    #[test]
    fn it_keeps_unknown_resource_types() {
        for b in [0x80u8, 0x85, 0x86, 0x87, 0x88, 0x00] {
            let kind = ResourceType::from_byte(b);
            assert_eq!(kind, ResourceType::Unknown(b));
            assert_eq!(kind.to_byte(), b);
            assert!(!kind.is_mesh());
        }
        assert!(ResourceType::from_byte(0x2F).is_mesh());
    }

    #[test]
    fn it_orders_states_as_tuples() {
        let mut states = vec![
            MapState::new(1, false, 0),
            MapState::new(0, true, 0),
            MapState::new(0, false, 4),
            MapState::new(0, false, 0),
        ];
        states.sort();
        assert_eq!(
            states,
            vec![
                MapState::new(0, false, 0),
                MapState::new(0, false, 4),
                MapState::new(0, true, 0),
                MapState::new(1, false, 0),
            ]
        );
    }

    #[test]
    fn it_parses_states() -> Result<()> {
        let state = "1, 1, 3".parse::<MapState>()?;
        assert_eq!(state, MapState::new(1, true, 3));
        assert_eq!(state.to_string(), "1,1,3");
        assert_eq!("2,night,0".parse::<MapState>()?, MapState::new(2, true, 0));
        assert!("1,2,3".parse::<MapState>().is_err());
        assert!("1,0".parse::<MapState>().is_err());
        assert!("x,0,0".parse::<MapState>().is_err());
        Ok(())
    }
}
