use super::{ModuleCode, ModuleValue, read_fixed};
use crate::error::{AcouseaError, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum BatteryStatus {
    #[strum(to_string = "error")]
    Error = 0,
    #[strum(to_string = "discharging")]
    Discharging = 1,
    #[strum(to_string = "charging")]
    Charging = 2,
    #[default]
    #[strum(to_string = "idle")]
    Idle = 3,
    #[strum(to_string = "full")]
    Full = 4,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct BatteryModuleRaw {
    pub percentage: u8,
    pub status: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryModule {
    pub percentage: u8,
    pub status: BatteryStatus,
}

impl BatteryModule {
    pub fn new(percentage: u8, status: BatteryStatus) -> Self {
        Self { percentage, status }
    }
}

impl TryFrom<BatteryModuleRaw> for BatteryModule {
    type Error = AcouseaError;

    fn try_from(raw: BatteryModuleRaw) -> Result<Self> {
        let status = BatteryStatus::try_from(raw.status).map_err(|_| AcouseaError::InvalidValue {
            field: "battery status",
            value: raw.status,
        })?;
        Ok(Self::new(raw.percentage, status))
    }
}

impl From<BatteryModule> for BatteryModuleRaw {
    fn from(module: BatteryModule) -> Self {
        BatteryModuleRaw {
            percentage: module.percentage,
            status: module.status.into(),
        }
    }
}

impl ModuleValue for BatteryModule {
    const CODE: ModuleCode = ModuleCode::Battery;

    fn encode_value(&self) -> Vec<u8> {
        BatteryModuleRaw::from(*self).as_bytes().to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        read_fixed::<BatteryModuleRaw>(Self::CODE, value)?.try_into()
    }
}
