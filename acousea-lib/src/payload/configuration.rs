use super::PayloadCodec;
use crate::error::Result;
use crate::module::{Module, ModuleCode, ModuleFactory};
use bytes::Bytes;

/// Module codes the backend wants the node to report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GetUpdatedNodeConfigurationPayload {
    pub requested: Vec<ModuleCode>,
}

impl GetUpdatedNodeConfigurationPayload {
    pub fn new(requested: Vec<ModuleCode>) -> Self {
        Self { requested }
    }
}

impl PayloadCodec for GetUpdatedNodeConfigurationPayload {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.requested.iter().map(|code| code.value()).collect())
    }

    fn bytes_size(&self) -> usize {
        self.requested.len()
    }

    fn from_bytes(data: Bytes) -> Result<Self> {
        let requested = data
            .iter()
            .map(|&byte| ModuleCode::from_value(byte))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(requested))
    }
}

/// A list of configuration modules.
///
/// Sent by the backend to change the configuration and by the node to report it. Decoding
/// only checks the TLV framing; the records themselves are decoded by [`Self::modules`] so
/// the routine consuming them can reject the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewNodeConfigurationPayload {
    records: Bytes,
}

impl NewNodeConfigurationPayload {
    pub fn new(modules: &[Module]) -> Result<Self> {
        Ok(Self {
            records: Bytes::from(ModuleFactory::encode_modules(modules)?),
        })
    }

    /// Wrap already framed records.
    pub fn from_records(records: Bytes) -> Result<Self> {
        ModuleFactory::check_framing(&records)?;
        Ok(Self { records })
    }

    pub fn modules(&self) -> Result<Vec<Module>> {
        ModuleFactory::create_modules(self.records.clone())
    }

    pub fn records(&self) -> &Bytes {
        &self.records
    }
}

impl PayloadCodec for NewNodeConfigurationPayload {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.records.to_vec())
    }

    fn bytes_size(&self) -> usize {
        self.records.len()
    }

    fn from_bytes(data: Bytes) -> Result<Self> {
        Self::from_records(data)
    }
}
