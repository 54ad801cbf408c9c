//! Typed, self-describing data units carried in payloads.
//!
//! Every module travels as a TLV record: `[code:1][len:1][value:len]`. [`SerializableModule`]
//! is the untyped record, [`Module`] the decoded form, and [`ModuleFactory`] walks a buffer of
//! back-to-back records.

pub mod battery;
pub mod environment;
pub mod factory;
pub mod iclisten;
pub mod location;
pub mod network;
pub mod operation_modes;
pub mod reporting;
pub mod rtc;

pub use battery::{BatteryModule, BatteryStatus};
pub use environment::{AmbientModule, StorageModule};
pub use factory::ModuleFactory;
pub use iclisten::{
    ICListenAspects, ICListenHF, ICListenLoggingConfig, ICListenRecordingStats, ICListenStatus,
    ICListenStreamingConfig,
};
pub use location::LocationModule;
pub use network::NetworkModule;
pub use operation_modes::{OperationModesGraphModule, OperationModesModule, Transition};
pub use reporting::{ReportType, ReportingEntry, ReportingModule, ReportingTechnology};
pub use rtc::RtcModule;

use crate::constants::{MAX_MODULE_VALUE_SIZE, MODULE_HEADER_SIZE};
use crate::error::{AcouseaError, Result};
use bytes::{Buf, BufMut, Bytes};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;
use zerocopy::FromBytes;

/// Tag identifying the layout of a module's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ModuleCode {
    #[strum(to_string = "BATTERY")]
    Battery = b'B',
    #[strum(to_string = "LOCATION")]
    Location = b'L',
    #[strum(to_string = "NETWORK")]
    Network = b'N',
    #[strum(to_string = "OPERATION_MODES")]
    OperationModes = b'O',
    #[strum(to_string = "OPERATION_MODES_GRAPH")]
    OperationModesGraph = b'G',
    #[strum(to_string = "REPORTING")]
    Reporting = b'P',
    #[strum(to_string = "REAL_TIME_CLOCK")]
    RealTimeClock = b'R',
    #[strum(to_string = "STORAGE")]
    Storage = b'S',
    #[strum(to_string = "AMBIENT")]
    Ambient = b'T',
    #[strum(to_string = "PAM_MODULE")]
    PamModule = b'M',
    #[strum(to_string = "ICLISTEN_COMPLETE")]
    ICListenComplete = b'i',
    #[strum(to_string = "ICLISTEN_STATUS")]
    ICListenStatus = b's',
    #[strum(to_string = "ICLISTEN_LOGGING_CONFIG")]
    ICListenLoggingConfig = b'l',
    #[strum(to_string = "ICLISTEN_STREAMING_CONFIG")]
    ICListenStreamingConfig = b'c',
    #[strum(to_string = "ICLISTEN_RECORDING_STATS")]
    ICListenRecordingStats = b'r',
}

impl ModuleCode {
    pub const ALL: [ModuleCode; 15] = [
        ModuleCode::Battery,
        ModuleCode::Location,
        ModuleCode::Network,
        ModuleCode::OperationModes,
        ModuleCode::OperationModesGraph,
        ModuleCode::Reporting,
        ModuleCode::RealTimeClock,
        ModuleCode::Storage,
        ModuleCode::Ambient,
        ModuleCode::PamModule,
        ModuleCode::ICListenComplete,
        ModuleCode::ICListenStatus,
        ModuleCode::ICListenLoggingConfig,
        ModuleCode::ICListenStreamingConfig,
        ModuleCode::ICListenRecordingStats,
    ];

    pub fn from_value(value: u8) -> Result<Self> {
        Self::try_from(value).map_err(|_| AcouseaError::InvalidModuleCode(value))
    }

    pub fn value(self) -> u8 {
        self.into()
    }
}

/// An untyped TLV record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializableModule {
    code: ModuleCode,
    value: Bytes,
}

impl SerializableModule {
    pub fn new(code: ModuleCode, value: impl Into<Bytes>) -> Result<Self> {
        let value = value.into();
        if value.len() > MAX_MODULE_VALUE_SIZE {
            return Err(AcouseaError::ModuleTooLarge(value.len()));
        }
        Ok(Self { code, value })
    }

    pub fn code(&self) -> ModuleCode {
        self.code
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Header plus value length.
    pub fn full_length(&self) -> usize {
        MODULE_HEADER_SIZE + self.value.len()
    }

    pub fn encode_into(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.code.value());
        // Length fits: checked in `new`
        buf.put_u8(self.value.len() as u8);
        buf.put_slice(&self.value);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.full_length());
        self.encode_into(&mut buf);
        buf
    }

    /// Take one record off the front of `buf`.
    ///
    /// A declared length running past the end of `buf` is an error and leaves `buf` untouched.
    pub fn parse(buf: &mut Bytes) -> Result<Self> {
        if buf.len() < MODULE_HEADER_SIZE {
            return Err(AcouseaError::InsufficientData {
                expected: MODULE_HEADER_SIZE,
                actual: buf.len(),
            });
        }
        let code = ModuleCode::from_value(buf[0])?;
        let len = buf[1] as usize;
        if buf.len() < MODULE_HEADER_SIZE + len {
            return Err(AcouseaError::InsufficientData {
                expected: MODULE_HEADER_SIZE + len,
                actual: buf.len(),
            });
        }
        buf.advance(MODULE_HEADER_SIZE);
        let value = buf.split_to(len);
        Ok(Self { code, value })
    }
}

/// A concrete module layout bound to one [`ModuleCode`].
pub trait ModuleValue: Sized {
    const CODE: ModuleCode;

    fn encode_value(&self) -> Vec<u8>;

    fn decode_value(value: &[u8]) -> Result<Self>;
}

/// Read a fixed-layout value, requiring the exact size.
pub(crate) fn read_fixed<T: FromBytes>(code: ModuleCode, value: &[u8]) -> Result<T> {
    T::read_from_bytes(value).map_err(|_| AcouseaError::ModuleLength {
        code,
        expected: size_of::<T>(),
        actual: value.len(),
    })
}

/// Module whose value is carried without interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PamModule {
    pub value: Bytes,
}

impl ModuleValue for PamModule {
    const CODE: ModuleCode = ModuleCode::PamModule;

    fn encode_value(&self) -> Vec<u8> {
        self.value.to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        Ok(Self {
            value: Bytes::copy_from_slice(value),
        })
    }
}

/// A decoded module.
#[derive(Debug, Clone, PartialEq)]
pub enum Module {
    Battery(BatteryModule),
    Location(LocationModule),
    Network(NetworkModule),
    OperationModes(OperationModesModule),
    OperationModesGraph(OperationModesGraphModule),
    Reporting(ReportingModule),
    RealTimeClock(RtcModule),
    Storage(StorageModule),
    Ambient(AmbientModule),
    Pam(PamModule),
    ICListenHF(ICListenHF),
    ICListenStatus(ICListenStatus),
    ICListenLoggingConfig(ICListenLoggingConfig),
    ICListenStreamingConfig(ICListenStreamingConfig),
    ICListenRecordingStats(ICListenRecordingStats),
}

impl Module {
    pub fn code(&self) -> ModuleCode {
        match self {
            Module::Battery(_) => BatteryModule::CODE,
            Module::Location(_) => LocationModule::CODE,
            Module::Network(_) => NetworkModule::CODE,
            Module::OperationModes(_) => OperationModesModule::CODE,
            Module::OperationModesGraph(_) => OperationModesGraphModule::CODE,
            Module::Reporting(_) => ReportingModule::CODE,
            Module::RealTimeClock(_) => RtcModule::CODE,
            Module::Storage(_) => StorageModule::CODE,
            Module::Ambient(_) => AmbientModule::CODE,
            Module::Pam(_) => PamModule::CODE,
            Module::ICListenHF(_) => ICListenHF::CODE,
            Module::ICListenStatus(_) => ICListenStatus::CODE,
            Module::ICListenLoggingConfig(_) => ICListenLoggingConfig::CODE,
            Module::ICListenStreamingConfig(_) => ICListenStreamingConfig::CODE,
            Module::ICListenRecordingStats(_) => ICListenRecordingStats::CODE,
        }
    }

    fn encode_value(&self) -> Vec<u8> {
        match self {
            Module::Battery(m) => m.encode_value(),
            Module::Location(m) => m.encode_value(),
            Module::Network(m) => m.encode_value(),
            Module::OperationModes(m) => m.encode_value(),
            Module::OperationModesGraph(m) => m.encode_value(),
            Module::Reporting(m) => m.encode_value(),
            Module::RealTimeClock(m) => m.encode_value(),
            Module::Storage(m) => m.encode_value(),
            Module::Ambient(m) => m.encode_value(),
            Module::Pam(m) => m.encode_value(),
            Module::ICListenHF(m) => m.encode_value(),
            Module::ICListenStatus(m) => m.encode_value(),
            Module::ICListenLoggingConfig(m) => m.encode_value(),
            Module::ICListenStreamingConfig(m) => m.encode_value(),
            Module::ICListenRecordingStats(m) => m.encode_value(),
        }
    }

    pub fn to_serializable(&self) -> Result<SerializableModule> {
        SerializableModule::new(self.code(), self.encode_value())
    }

    /// Decode a record with the layout selected by its tag.
    pub fn from_serializable(module: &SerializableModule) -> Result<Self> {
        let value = module.value().as_ref();
        Ok(match module.code() {
            ModuleCode::Battery => Module::Battery(BatteryModule::decode_value(value)?),
            ModuleCode::Location => Module::Location(LocationModule::decode_value(value)?),
            ModuleCode::Network => Module::Network(NetworkModule::decode_value(value)?),
            ModuleCode::OperationModes => Module::OperationModes(OperationModesModule::decode_value(value)?),
            ModuleCode::OperationModesGraph => {
                Module::OperationModesGraph(OperationModesGraphModule::decode_value(value)?)
            }
            ModuleCode::Reporting => Module::Reporting(ReportingModule::decode_value(value)?),
            ModuleCode::RealTimeClock => Module::RealTimeClock(RtcModule::decode_value(value)?),
            ModuleCode::Storage => Module::Storage(StorageModule::decode_value(value)?),
            ModuleCode::Ambient => Module::Ambient(AmbientModule::decode_value(value)?),
            ModuleCode::PamModule => Module::Pam(PamModule::decode_value(value)?),
            ModuleCode::ICListenComplete => Module::ICListenHF(ICListenHF::decode_value(value)?),
            ModuleCode::ICListenStatus => Module::ICListenStatus(ICListenStatus::decode_value(value)?),
            ModuleCode::ICListenLoggingConfig => {
                Module::ICListenLoggingConfig(ICListenLoggingConfig::decode_value(value)?)
            }
            ModuleCode::ICListenStreamingConfig => {
                Module::ICListenStreamingConfig(ICListenStreamingConfig::decode_value(value)?)
            }
            ModuleCode::ICListenRecordingStats => {
                Module::ICListenRecordingStats(ICListenRecordingStats::decode_value(value)?)
            }
        })
    }

    pub fn encode_into(&self, buf: &mut impl BufMut) -> Result<()> {
        self.to_serializable()?.encode_into(buf);
        Ok(())
    }

    pub fn encoded_len(&self) -> usize {
        MODULE_HEADER_SIZE + self.encode_value().len()
    }
}

macro_rules! impl_into_module {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Module {
                fn from(module: $ty) -> Self {
                    Module::$variant(module)
                }
            }
        )*
    };
}

impl_into_module! {
    BatteryModule => Battery,
    LocationModule => Location,
    NetworkModule => Network,
    OperationModesModule => OperationModes,
    OperationModesGraphModule => OperationModesGraph,
    ReportingModule => Reporting,
    RtcModule => RealTimeClock,
    StorageModule => Storage,
    AmbientModule => Ambient,
    PamModule => Pam,
    ICListenHF => ICListenHF,
    ICListenStatus => ICListenStatus,
    ICListenLoggingConfig => ICListenLoggingConfig,
    ICListenStreamingConfig => ICListenStreamingConfig,
    ICListenRecordingStats => ICListenRecordingStats,
}
