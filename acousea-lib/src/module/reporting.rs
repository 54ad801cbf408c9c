use super::{ModuleCode, ModuleValue};
use crate::error::{AcouseaError, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;
use zerocopy::byteorder::big_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Kind of report sent when a reporting period elapses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ReportType {
    #[strum(to_string = "COMPLETE")]
    Complete = b'C',
    #[strum(to_string = "BASIC")]
    Basic = b'B',
    #[strum(to_string = "SUMMARY")]
    Summary = b'S',
}

impl ReportType {
    pub fn from_value(value: u8) -> Result<Self> {
        Self::try_from(value).map_err(|_| AcouseaError::InvalidReportType(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ReportingTechnology {
    #[strum(to_string = "LoRa")]
    Lora = 1,
    #[strum(to_string = "Iridium")]
    Iridium = 2,
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct ReportingEntryRaw {
    pub mode_id: u8,
    pub period: U16,
    pub report_type: u8,
}

/// How often, in minutes, and what to report while a mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingEntry {
    pub period: u16,
    pub report_type: ReportType,
}

/// Reporting schedule of one transport.
///
/// Value layout: `[technology][mode_id, period:u16 BE, report_type]*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingModule {
    pub technology: ReportingTechnology,
    pub entries: BTreeMap<u8, ReportingEntry>,
}

impl ReportingModule {
    pub fn new(technology: ReportingTechnology) -> Self {
        Self {
            technology,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, mode_id: u8, period: u16, report_type: ReportType) -> Self {
        self.entries.insert(mode_id, ReportingEntry { period, report_type });
        self
    }
}

impl ModuleValue for ReportingModule {
    const CODE: ModuleCode = ModuleCode::Reporting;

    fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(1 + self.entries.len() * size_of::<ReportingEntryRaw>());
        value.push(self.technology.into());
        for (&mode_id, entry) in &self.entries {
            let raw = ReportingEntryRaw {
                mode_id,
                period: U16::new(entry.period),
                report_type: entry.report_type.into(),
            };
            value.extend_from_slice(raw.as_bytes());
        }
        value
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        let Some((&technology, rest)) = value.split_first() else {
            return Err(AcouseaError::InsufficientData { expected: 1, actual: 0 });
        };
        let technology = ReportingTechnology::try_from(technology).map_err(|_| AcouseaError::InvalidValue {
            field: "reporting technology",
            value: technology,
        })?;
        let entries = <[ReportingEntryRaw]>::ref_from_bytes(rest).map_err(|_| AcouseaError::ModuleLength {
            code: Self::CODE,
            expected: 1 + rest.len().next_multiple_of(size_of::<ReportingEntryRaw>()),
            actual: value.len(),
        })?;

        let mut module = Self::new(technology);
        for entry in entries {
            let report_type = ReportType::from_value(entry.report_type)?;
            let previous = module.entries.insert(
                entry.mode_id,
                ReportingEntry {
                    period: entry.period.get(),
                    report_type,
                },
            );
            if previous.is_some() {
                return Err(AcouseaError::InvalidPayload(format!(
                    "reporting entry for mode {} listed twice",
                    entry.mode_id
                )));
            }
        }
        Ok(module)
    }
}
