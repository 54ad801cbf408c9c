use super::{ModuleCode, ModuleValue};
use crate::error::{AcouseaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zerocopy::byteorder::big_endian::U16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Known mode ids and the index of the active one.
///
/// Value layout: `[mode_id]*[active_index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationModesModule {
    pub modes: Vec<u8>,
    pub active_index: u8,
}

impl OperationModesModule {
    pub fn new(modes: Vec<u8>, active_index: u8) -> Result<Self> {
        if active_index as usize >= modes.len() {
            return Err(AcouseaError::InvalidValue {
                field: "active operation mode index",
                value: active_index,
            });
        }
        Ok(Self { modes, active_index })
    }

    pub fn active_mode(&self) -> Option<u8> {
        self.modes.get(self.active_index as usize).copied()
    }
}

impl ModuleValue for OperationModesModule {
    const CODE: ModuleCode = ModuleCode::OperationModes;

    fn encode_value(&self) -> Vec<u8> {
        let mut value = self.modes.clone();
        value.push(self.active_index);
        value
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        match value.split_last() {
            Some((&active_index, modes)) => Self::new(modes.to_vec(), active_index),
            None => Err(AcouseaError::ModuleLength {
                code: Self::CODE,
                expected: 1,
                actual: 0,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct GraphEntryRaw {
    pub current: u8,
    pub next: u8,
    pub duration: U16,
}

/// Edge of the operation-mode graph: where to go and after how many cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub next_mode: u8,
    pub duration: u16,
}

/// State graph of operation modes keyed by mode id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationModesGraphModule {
    pub graph: BTreeMap<u8, Transition>,
}

impl OperationModesGraphModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transition(mut self, mode: u8, next_mode: u8, duration: u16) -> Self {
        self.graph.insert(mode, Transition { next_mode, duration });
        self
    }

    /// Every mode reached by a transition must have an entry of its own.
    pub fn validate(&self) -> Result<()> {
        if self.graph.is_empty() {
            return Err(AcouseaError::Config("operation graph is empty".to_string()));
        }
        for (mode, transition) in &self.graph {
            if !self.graph.contains_key(&transition.next_mode) {
                return Err(AcouseaError::Config(format!(
                    "mode {mode} transitions to undefined mode {}",
                    transition.next_mode
                )));
            }
        }
        Ok(())
    }
}

impl ModuleValue for OperationModesGraphModule {
    const CODE: ModuleCode = ModuleCode::OperationModesGraph;

    fn encode_value(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(self.graph.len() * size_of::<GraphEntryRaw>());
        for (&mode, transition) in &self.graph {
            let raw = GraphEntryRaw {
                current: mode,
                next: transition.next_mode,
                duration: U16::new(transition.duration),
            };
            value.extend_from_slice(raw.as_bytes());
        }
        value
    }

    fn decode_value(value: &[u8]) -> Result<Self> {
        let entries = <[GraphEntryRaw]>::ref_from_bytes(value).map_err(|_| AcouseaError::ModuleLength {
            code: Self::CODE,
            expected: value.len().next_multiple_of(size_of::<GraphEntryRaw>()),
            actual: value.len(),
        })?;
        let mut module = Self::new();
        for entry in entries {
            let transition = Transition {
                next_mode: entry.next,
                duration: entry.duration.get(),
            };
            if module.graph.insert(entry.current, transition).is_some() {
                return Err(AcouseaError::InvalidPayload(format!(
                    "operation mode {} listed twice",
                    entry.current
                )));
            }
        }
        Ok(module)
    }
}
