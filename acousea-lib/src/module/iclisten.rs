//! Status and configuration aspects of the iClisten acoustic logger.
//!
//! Each aspect is a module of its own. [`ICListenHF`] bundles all four as nested TLV records
//! under the `ICLISTEN_COMPLETE` tag.

use super::{Module, ModuleCode, ModuleFactory, ModuleValue, read_fixed};
use crate::error::{AcouseaError, Result};
use bytes::Bytes;
use modular_bitfield::prelude::*;
use zerocopy::byteorder::{big_endian, little_endian};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Selection of iClisten aspects, one bit each.
#[bitfield(bytes = 1)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ICListenAspects {
    pub status: bool,
    pub logging: bool,
    pub streaming: bool,
    pub stats: bool,
    #[skip]
    unused: B4,
}

impl ICListenAspects {
    pub fn all() -> Self {
        Self::new()
            .with_status(true)
            .with_logging(true)
            .with_streaming(true)
            .with_stats(true)
    }

    pub fn is_empty(&self) -> bool {
        !(self.status() || self.logging() || self.streaming() || self.stats())
    }
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ICListenStatusRaw {
    pub unit_status: u8,
    pub battery_status: u8,
    pub battery_percentage: little_endian::F64,
    pub temperature: little_endian::F64,
    pub humidity: little_endian::F64,
    pub timestamp: little_endian::I64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ICListenStatus {
    pub unit_status: u8,
    pub battery_status: u8,
    pub battery_percentage: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: i64,
}

impl From<ICListenStatusRaw> for ICListenStatus {
    fn from(raw: ICListenStatusRaw) -> Self {
        Self {
            unit_status: raw.unit_status,
            battery_status: raw.battery_status,
            battery_percentage: raw.battery_percentage.get(),
            temperature: raw.temperature.get(),
            humidity: raw.humidity.get(),
            timestamp: raw.timestamp.get(),
        }
    }
}

impl From<ICListenStatus> for ICListenStatusRaw {
    fn from(status: ICListenStatus) -> Self {
        Self {
            unit_status: status.unit_status,
            battery_status: status.battery_status,
            battery_percentage: little_endian::F64::new(status.battery_percentage),
            temperature: little_endian::F64::new(status.temperature),
            humidity: little_endian::F64::new(status.humidity),
            timestamp: little_endian::I64::new(status.timestamp),
        }
    }
}

impl ModuleValue for ICListenStatus {
    const CODE: ModuleCode = ModuleCode::ICListenStatus;

    fn encode_value(&self) -> Vec<u8> {
        ICListenStatusRaw::from(*self).as_bytes().to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        read_fixed::<ICListenStatusRaw>(Self::CODE, value).map(Self::from)
    }
}

// Multi-byte logging fields are big-endian on the wire
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ICListenLoggingConfigRaw {
    pub gain: big_endian::U16,
    pub waveform_sample_rate: big_endian::I32,
    pub waveform_logging_mode: u8,
    pub waveform_log_length: u8,
    pub bit_depth: u8,
    pub fft_sample_rate: big_endian::I32,
    pub fft_processing_type: big_endian::U16,
    pub ffts_accumulated: big_endian::U16,
    pub fft_logging_mode: u8,
    pub fft_log_length: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ICListenLoggingConfig {
    pub gain: u16,
    pub waveform_sample_rate: i32,
    pub waveform_logging_mode: u8,
    pub waveform_log_length: u8,
    pub bit_depth: u8,
    pub fft_sample_rate: i32,
    pub fft_processing_type: u16,
    pub ffts_accumulated: u16,
    pub fft_logging_mode: u8,
    pub fft_log_length: u8,
}

impl From<ICListenLoggingConfigRaw> for ICListenLoggingConfig {
    fn from(raw: ICListenLoggingConfigRaw) -> Self {
        Self {
            gain: raw.gain.get(),
            waveform_sample_rate: raw.waveform_sample_rate.get(),
            waveform_logging_mode: raw.waveform_logging_mode,
            waveform_log_length: raw.waveform_log_length,
            bit_depth: raw.bit_depth,
            fft_sample_rate: raw.fft_sample_rate.get(),
            fft_processing_type: raw.fft_processing_type.get(),
            ffts_accumulated: raw.ffts_accumulated.get(),
            fft_logging_mode: raw.fft_logging_mode,
            fft_log_length: raw.fft_log_length,
        }
    }
}

impl From<ICListenLoggingConfig> for ICListenLoggingConfigRaw {
    fn from(config: ICListenLoggingConfig) -> Self {
        Self {
            gain: big_endian::U16::new(config.gain),
            waveform_sample_rate: big_endian::I32::new(config.waveform_sample_rate),
            waveform_logging_mode: config.waveform_logging_mode,
            waveform_log_length: config.waveform_log_length,
            bit_depth: config.bit_depth,
            fft_sample_rate: big_endian::I32::new(config.fft_sample_rate),
            fft_processing_type: big_endian::U16::new(config.fft_processing_type),
            ffts_accumulated: big_endian::U16::new(config.ffts_accumulated),
            fft_logging_mode: config.fft_logging_mode,
            fft_log_length: config.fft_log_length,
        }
    }
}

impl ModuleValue for ICListenLoggingConfig {
    const CODE: ModuleCode = ModuleCode::ICListenLoggingConfig;

    fn encode_value(&self) -> Vec<u8> {
        ICListenLoggingConfigRaw::from(*self).as_bytes().to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        read_fixed::<ICListenLoggingConfigRaw>(Self::CODE, value).map(Self::from)
    }
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ICListenStreamingConfigRaw {
    pub record_waveform: u8,
    pub process_waveform: u8,
    pub waveform_processing_type: u8,
    pub waveform_interval: u8,
    pub waveform_duration: u8,
    pub record_fft: u8,
    pub process_fft: u8,
    pub fft_processing_type: u8,
    pub fft_interval: u8,
    pub fft_duration: u8,
    pub timestamp: little_endian::I64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ICListenStreamingConfig {
    pub record_waveform: bool,
    pub process_waveform: bool,
    pub waveform_processing_type: u8,
    pub waveform_interval: u8,
    pub waveform_duration: u8,
    pub record_fft: bool,
    pub process_fft: bool,
    pub fft_processing_type: u8,
    pub fft_interval: u8,
    pub fft_duration: u8,
    pub timestamp: i64,
}

fn flag(field: &'static str, value: u8) -> Result<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(AcouseaError::InvalidValue { field, value }),
    }
}

impl TryFrom<ICListenStreamingConfigRaw> for ICListenStreamingConfig {
    type Error = AcouseaError;

    fn try_from(raw: ICListenStreamingConfigRaw) -> Result<Self> {
        Ok(Self {
            record_waveform: flag("record waveform flag", raw.record_waveform)?,
            process_waveform: flag("process waveform flag", raw.process_waveform)?,
            waveform_processing_type: raw.waveform_processing_type,
            waveform_interval: raw.waveform_interval,
            waveform_duration: raw.waveform_duration,
            record_fft: flag("record FFT flag", raw.record_fft)?,
            process_fft: flag("process FFT flag", raw.process_fft)?,
            fft_processing_type: raw.fft_processing_type,
            fft_interval: raw.fft_interval,
            fft_duration: raw.fft_duration,
            timestamp: raw.timestamp.get(),
        })
    }
}

impl From<ICListenStreamingConfig> for ICListenStreamingConfigRaw {
    fn from(config: ICListenStreamingConfig) -> Self {
        Self {
            record_waveform: config.record_waveform.into(),
            process_waveform: config.process_waveform.into(),
            waveform_processing_type: config.waveform_processing_type,
            waveform_interval: config.waveform_interval,
            waveform_duration: config.waveform_duration,
            record_fft: config.record_fft.into(),
            process_fft: config.process_fft.into(),
            fft_processing_type: config.fft_processing_type,
            fft_interval: config.fft_interval,
            fft_duration: config.fft_duration,
            timestamp: little_endian::I64::new(config.timestamp),
        }
    }
}

impl ModuleValue for ICListenStreamingConfig {
    const CODE: ModuleCode = ModuleCode::ICListenStreamingConfig;

    fn encode_value(&self) -> Vec<u8> {
        ICListenStreamingConfigRaw::from(*self).as_bytes().to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        read_fixed::<ICListenStreamingConfigRaw>(Self::CODE, value)?.try_into()
    }
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ICListenRecordingStatsRaw {
    pub epoch_time: little_endian::I64,
    pub clicks: u8,
    pub minutes: u8,
    pub files: u8,
}

/// Recording counters since `epoch_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ICListenRecordingStats {
    pub epoch_time: i64,
    pub clicks: u8,
    pub minutes: u8,
    pub files: u8,
}

impl ModuleValue for ICListenRecordingStats {
    const CODE: ModuleCode = ModuleCode::ICListenRecordingStats;

    fn encode_value(&self) -> Vec<u8> {
        ICListenRecordingStatsRaw {
            epoch_time: little_endian::I64::new(self.epoch_time),
            clicks: self.clicks,
            minutes: self.minutes,
            files: self.files,
        }
        .as_bytes()
        .to_vec()
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        let raw = read_fixed::<ICListenRecordingStatsRaw>(Self::CODE, value)?;
        Ok(Self {
            epoch_time: raw.epoch_time.get(),
            clicks: raw.clicks,
            minutes: raw.minutes,
            files: raw.files,
        })
    }
}

/// Complete iClisten HF state: every aspect at once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ICListenHF {
    pub status: ICListenStatus,
    pub logging: ICListenLoggingConfig,
    pub streaming: ICListenStreamingConfig,
    pub stats: ICListenRecordingStats,
}

impl ICListenHF {
    pub const NAME: &'static str = "ICListenHF";
}

fn push_record<M: ModuleValue>(buf: &mut Vec<u8>, module: &M) {
    let value = module.encode_value();
    buf.push(M::CODE.value());
    // Aspect layouts are fixed and well below 255 bytes
    buf.push(value.len() as u8);
    buf.extend_from_slice(&value);
}

impl ModuleValue for ICListenHF {
    const CODE: ModuleCode = ModuleCode::ICListenComplete;

    fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::new();
        push_record(&mut value, &self.status);
        push_record(&mut value, &self.logging);
        push_record(&mut value, &self.streaming);
        push_record(&mut value, &self.stats);
        value
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        let modules = ModuleFactory::create_modules(Bytes::copy_from_slice(value))?;
        match modules.as_slice() {
            [
                Module::ICListenStatus(status),
                Module::ICListenLoggingConfig(logging),
                Module::ICListenStreamingConfig(streaming),
                Module::ICListenRecordingStats(stats),
            ] => Ok(Self {
                status: *status,
                logging: *logging,
                streaming: *streaming,
                stats: *stats,
            }),
            _ => Err(AcouseaError::InvalidPayload(format!(
                "{} expects status, logging, streaming and stats records in order",
                Self::NAME
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_sizes() {
        assert_eq!(size_of::<ICListenStatusRaw>(), 34);
        assert_eq!(size_of::<ICListenLoggingConfigRaw>(), 19);
        assert_eq!(size_of::<ICListenStreamingConfigRaw>(), 18);
        assert_eq!(size_of::<ICListenRecordingStatsRaw>(), 11);
        assert_eq!(ICListenHF::default().encode_value().len(), 34 + 19 + 18 + 11 + 4 * 2);
    }

    #[test]
    fn test_aspect_mask_bits() {
        assert_eq!(ICListenAspects::new().with_status(true).into_bytes(), [0x01]);
        assert_eq!(ICListenAspects::new().with_logging(true).into_bytes(), [0x02]);
        assert_eq!(ICListenAspects::new().with_streaming(true).into_bytes(), [0x04]);
        assert_eq!(ICListenAspects::new().with_stats(true).into_bytes(), [0x08]);
        assert_eq!(ICListenAspects::all().into_bytes(), [0x0F]);
        assert!(ICListenAspects::from_bytes([0x00]).is_empty());
    }

    #[test]
    fn test_logging_config_big_endian() {
        let config = ICListenLoggingConfig {
            gain: 0x0102,
            waveform_sample_rate: 32000,
            ..Default::default()
        };
        let bytes = config.encode_value();
        assert_eq!(&bytes[..2], &[0x01, 0x02]);
        assert_eq!(&bytes[2..6], &32000i32.to_be_bytes());
        assert_eq!(ICListenLoggingConfig::decode_value(&bytes).unwrap(), config);
    }

    #[test]
    fn test_streaming_flag_validation() {
        let mut bytes = ICListenStreamingConfig::default().encode_value();
        bytes[0] = 2;
        assert!(matches!(
            ICListenStreamingConfig::decode_value(&bytes),
            Err(AcouseaError::InvalidValue { value: 2, .. })
        ));
    }

    #[test]
    fn test_complete_roundtrip() {
        let hf = ICListenHF {
            status: ICListenStatus {
                unit_status: 1,
                battery_status: 2,
                battery_percentage: 88.5,
                temperature: 12.25,
                humidity: 40.0,
                timestamp: 1_700_000_000,
            },
            stats: ICListenRecordingStats {
                epoch_time: 1_700_000_100,
                clicks: 3,
                minutes: 10,
                files: 2,
            },
            ..Default::default()
        };
        assert_eq!(ICListenHF::decode_value(&hf.encode_value()).unwrap(), hf);
    }

    #[test]
    fn test_complete_rejects_reordered_aspects() {
        let hf = ICListenHF::default();
        let mut value = Vec::new();
        push_record(&mut value, &hf.logging);
        push_record(&mut value, &hf.status);
        push_record(&mut value, &hf.streaming);
        push_record(&mut value, &hf.stats);
        assert!(matches!(ICListenHF::decode_value(&value), Err(AcouseaError::InvalidPayload(_))));
    }
}
