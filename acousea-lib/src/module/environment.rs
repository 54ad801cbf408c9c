use super::{ModuleCode, ModuleValue, read_fixed};
use crate::error::Result;
use zerocopy::byteorder::little_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct StorageModuleRaw {
    pub used: I32,
    pub total: I32,
}

/// Storage occupancy in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageModule {
    pub used: i32,
    pub total: i32,
}

impl StorageModule {
    pub fn new(used: i32, total: i32) -> Self {
        Self { used, total }
    }
}

impl ModuleValue for StorageModule {
    const CODE: ModuleCode = ModuleCode::Storage;

    fn encode_value(&self) -> Vec<u8> {
        StorageModuleRaw {
            used: I32::new(self.used),
            total: I32::new(self.total),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        let raw = read_fixed::<StorageModuleRaw>(Self::CODE, value)?;
        Ok(Self::new(raw.used.get(), raw.total.get()))
    }
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct AmbientModuleRaw {
    pub temperature: u8,
    pub humidity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AmbientModule {
    pub temperature: u8,
    pub humidity: u8,
}

impl AmbientModule {
    pub fn new(temperature: u8, humidity: u8) -> Self {
        Self { temperature, humidity }
    }
}

impl ModuleValue for AmbientModule {
    const CODE: ModuleCode = ModuleCode::Ambient;

    fn encode_value(&self) -> Vec<u8> {
        AmbientModuleRaw {
            temperature: self.temperature,
            humidity: self.humidity,
        }
        .as_bytes()
        .to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        let raw = read_fixed::<AmbientModuleRaw>(Self::CODE, value)?;
        Ok(Self::new(raw.temperature, raw.humidity))
    }
}
