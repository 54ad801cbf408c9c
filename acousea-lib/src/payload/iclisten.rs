use super::{PayloadCodec, expect_len};
use crate::error::{AcouseaError, Result};
use crate::module::{
    ICListenAspects, ICListenLoggingConfig, ICListenRecordingStats, ICListenStatus, ICListenStreamingConfig, Module, ModuleFactory,
};
use bytes::Bytes;

/// Aspect mask requested by `GET_ICLISTEN_CONFIG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchICListenConfigurationPayload {
    pub aspects: ICListenAspects,
}

impl FetchICListenConfigurationPayload {
    pub const SIZE: usize = 1;

    pub fn new(aspects: ICListenAspects) -> Self {
        Self { aspects }
    }
}

impl PayloadCodec for FetchICListenConfigurationPayload {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.aspects.into_bytes().to_vec())
    }

    fn bytes_size(&self) -> usize {
        Self::SIZE
    }

    fn from_bytes(data: Bytes) -> Result<Self> {
        expect_len(&data, Self::SIZE)?;
        Ok(Self::new(ICListenAspects::from_bytes([data[0]])))
    }
}

/// Any subset of the four iClisten aspects, each at most once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SetICListenConfigurationPayload {
    pub status: Option<ICListenStatus>,
    pub logging: Option<ICListenLoggingConfig>,
    pub streaming: Option<ICListenStreamingConfig>,
    pub stats: Option<ICListenRecordingStats>,
}

impl SetICListenConfigurationPayload {
    fn modules(&self) -> Vec<Module> {
        let mut modules = Vec::with_capacity(4);
        modules.extend(self.status.map(Module::from));
        modules.extend(self.logging.map(Module::from));
        modules.extend(self.streaming.map(Module::from));
        modules.extend(self.stats.map(Module::from));
        modules
    }

    pub fn aspects(&self) -> ICListenAspects {
        ICListenAspects::new()
            .with_status(self.status.is_some())
            .with_logging(self.logging.is_some())
            .with_streaming(self.streaming.is_some())
            .with_stats(self.stats.is_some())
    }
}

fn place<T>(slot: &mut Option<T>, value: T, what: &str) -> Result<()> {
    if slot.replace(value).is_some() {
        return Err(AcouseaError::InvalidPayload(format!("iClisten {what} listed twice")));
    }
    Ok(())
}

impl PayloadCodec for SetICListenConfigurationPayload {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        ModuleFactory::encode_modules(&self.modules())
    }

    fn bytes_size(&self) -> usize {
        self.modules().iter().map(Module::encoded_len).sum()
    }

    fn from_bytes(data: Bytes) -> Result<Self> {
        let mut payload = Self::default();
        for module in ModuleFactory::create_modules(data)? {
            match module {
                Module::ICListenStatus(m) => place(&mut payload.status, m, "status")?,
                Module::ICListenLoggingConfig(m) => place(&mut payload.logging, m, "logging config")?,
                Module::ICListenStreamingConfig(m) => place(&mut payload.streaming, m, "streaming config")?,
                Module::ICListenRecordingStats(m) => place(&mut payload.stats, m, "recording stats")?,
                other => {
                    return Err(AcouseaError::InvalidPayload(format!(
                        "module {} is not an iClisten aspect",
                        other.code()
                    )));
                }
            }
        }
        Ok(payload)
    }
}
