use super::{PayloadCodec, expect_len};
use crate::constants::MODULE_HEADER_SIZE;
use crate::error::{AcouseaError, Result};
use crate::module::{
    AmbientModule, BatteryModule, ICListenHF, LocationModule, Module, ModuleFactory, RtcModule, StorageModule,
};
use bytes::Bytes;

/// Battery, position and clock, in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicStatusReportPayload {
    pub battery: BatteryModule,
    pub location: LocationModule,
    pub rtc: RtcModule,
}

impl BasicStatusReportPayload {
    /// Three records: 2 + 8 + 8 value bytes plus headers.
    pub const SIZE: usize = 3 * MODULE_HEADER_SIZE + 2 + 8 + 8;

    pub fn new(battery: BatteryModule, location: LocationModule, rtc: RtcModule) -> Self {
        Self {
            battery,
            location,
            rtc,
        }
    }

    fn modules(&self) -> [Module; 3] {
        [self.battery.into(), self.location.into(), self.rtc.into()]
    }
}

impl PayloadCodec for BasicStatusReportPayload {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        ModuleFactory::encode_modules(&self.modules())
    }

    fn bytes_size(&self) -> usize {
        Self::SIZE
    }

    fn from_bytes(data: Bytes) -> Result<Self> {
        expect_len(&data, Self::SIZE)?;
        match ModuleFactory::create_modules(data)?.as_slice() {
            [Module::Battery(battery), Module::Location(location), Module::RealTimeClock(rtc)] => {
                Ok(Self::new(*battery, *location, *rtc))
            }
            _ => Err(AcouseaError::InvalidPayload(
                "basic status report expects battery, location and clock modules".to_string(),
            )),
        }
    }
}

/// Full node status including the acoustic logger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompleteStatusReportPayload {
    pub battery: BatteryModule,
    pub ambient: AmbientModule,
    pub location: LocationModule,
    pub storage: StorageModule,
    pub pam: ICListenHF,
}

impl CompleteStatusReportPayload {
    /// Five records; the iClisten record nests four aspect records of 34, 19, 18 and 11 bytes.
    pub const SIZE: usize = 5 * MODULE_HEADER_SIZE + 2 + 2 + 8 + 8 + (4 * MODULE_HEADER_SIZE + 34 + 19 + 18 + 11);

    fn modules(&self) -> [Module; 5] {
        [
            self.battery.into(),
            self.ambient.into(),
            self.location.into(),
            self.storage.into(),
            self.pam.into(),
        ]
    }
}

impl PayloadCodec for CompleteStatusReportPayload {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        ModuleFactory::encode_modules(&self.modules())
    }

    fn bytes_size(&self) -> usize {
        Self::SIZE
    }

    fn from_bytes(data: Bytes) -> Result<Self> {
        expect_len(&data, Self::SIZE)?;
        match ModuleFactory::create_modules(data)?.as_slice() {
            [
                Module::Battery(battery),
                Module::Ambient(ambient),
                Module::Location(location),
                Module::Storage(storage),
                Module::ICListenHF(pam),
            ] => Ok(Self {
                battery: *battery,
                ambient: *ambient,
                location: *location,
                storage: *storage,
                pam: *pam,
            }),
            _ => Err(AcouseaError::InvalidPayload(
                "complete status report expects battery, ambient, location, storage and iClisten modules"
                    .to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::BatteryStatus;

    fn basic() -> BasicStatusReportPayload {
        BasicStatusReportPayload::new(
            BatteryModule::new(77, BatteryStatus::Charging),
            LocationModule::new(28.1, -15.4),
            RtcModule::new(1_700_000_000),
        )
    }

    #[test]
    fn test_basic_size_matches_bytes() {
        let payload = basic();
        assert_eq!(payload.to_bytes().unwrap().len(), payload.bytes_size());
    }

    #[test]
    fn test_complete_size_matches_bytes() {
        let payload = CompleteStatusReportPayload {
            battery: BatteryModule::new(50, BatteryStatus::Discharging),
            ambient: AmbientModule::default(),
            location: LocationModule::new(0.0, 0.0),
            storage: StorageModule::default(),
            pam: ICListenHF::default(),
        };
        let bytes = payload.to_bytes().unwrap();
        assert_eq!(bytes.len(), payload.bytes_size());
        assert_eq!(CompleteStatusReportPayload::from_bytes(Bytes::from(bytes)).unwrap(), payload);
    }

    #[test]
    fn test_basic_truncated() {
        let mut bytes = basic().to_bytes().unwrap();
        bytes.pop();
        assert!(matches!(
            BasicStatusReportPayload::from_bytes(Bytes::from(bytes)),
            Err(AcouseaError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_basic_wrong_order() {
        let p = basic();
        let reordered: [Module; 3] = [p.location.into(), p.battery.into(), p.rtc.into()];
        let bytes = ModuleFactory::encode_modules(&reordered).unwrap();
        assert!(matches!(
            BasicStatusReportPayload::from_bytes(Bytes::from(bytes)),
            Err(AcouseaError::InvalidPayload(_))
        ));
    }
}
