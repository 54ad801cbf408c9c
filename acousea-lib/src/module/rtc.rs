use super::{ModuleCode, ModuleValue, read_fixed};
use crate::error::Result;
use chrono::{DateTime, Utc};
use zerocopy::byteorder::little_endian::I64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RtcModuleRaw {
    pub epoch: I64,
}

/// Real-time clock reading, seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcModule {
    pub epoch: i64,
}

impl RtcModule {
    pub fn new(epoch: i64) -> Self {
        Self { epoch }
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.epoch, 0)
    }
}

impl ModuleValue for RtcModule {
    const CODE: ModuleCode = ModuleCode::RealTimeClock;

    fn encode_value(&self) -> Vec<u8> {
        RtcModuleRaw {
            epoch: I64::new(self.epoch),
        }
        .as_bytes()
        .to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        let raw = read_fixed::<RtcModuleRaw>(Self::CODE, value)?;
        Ok(Self::new(raw.epoch.get()))
    }
}
