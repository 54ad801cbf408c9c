use super::{ModuleCode, ModuleValue, read_fixed};
use crate::error::Result;
use zerocopy::byteorder::little_endian::F32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct LocationModuleRaw {
    pub latitude: F32,
    pub longitude: F32,
}

/// Position fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationModule {
    pub latitude: f32,
    pub longitude: f32,
}

impl LocationModule {
    pub fn new(latitude: f32, longitude: f32) -> Self {
        Self { latitude, longitude }
    }
}

impl From<LocationModuleRaw> for LocationModule {
    fn from(raw: LocationModuleRaw) -> Self {
        Self::new(raw.latitude.get(), raw.longitude.get())
    }
}

impl From<LocationModule> for LocationModuleRaw {
    fn from(module: LocationModule) -> Self {
        LocationModuleRaw {
            latitude: F32::new(module.latitude),
            longitude: F32::new(module.longitude),
        }
    }
}

impl ModuleValue for LocationModule {
    const CODE: ModuleCode = ModuleCode::Location;

    fn encode_value(&self) -> Vec<u8> {
        LocationModuleRaw::from(*self).as_bytes().to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        read_fixed::<LocationModuleRaw>(Self::CODE, value).map(Self::from)
    }
}
