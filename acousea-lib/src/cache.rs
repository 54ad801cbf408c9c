use crate::error::{AcouseaError, Result};
use crate::module::{
    ICListenAspects, ICListenHF, ICListenLoggingConfig, ICListenRecordingStats, ICListenStatus, ICListenStreamingConfig,
};
use crate::payload::SetICListenConfigurationPayload;

/// Last known state of the iClisten logger, one slot per aspect.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ICListenCache {
    status: Option<ICListenStatus>,
    logging: Option<ICListenLoggingConfig>,
    streaming: Option<ICListenStreamingConfig>,
    stats: Option<ICListenRecordingStats>,
}

impl ICListenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the aspects present in `update`, keeping the others.
    pub fn store(&mut self, update: &SetICListenConfigurationPayload) {
        if let Some(status) = update.status {
            self.status = Some(status);
        }
        if let Some(logging) = update.logging {
            self.logging = Some(logging);
        }
        if let Some(streaming) = update.streaming {
            self.streaming = Some(streaming);
        }
        if let Some(stats) = update.stats {
            self.stats = Some(stats);
        }
    }

    /// Aspects currently held.
    pub fn aspects(&self) -> ICListenAspects {
        self.snapshot().aspects()
    }

    pub fn snapshot(&self) -> SetICListenConfigurationPayload {
        SetICListenConfigurationPayload {
            status: self.status,
            logging: self.logging,
            streaming: self.streaming,
            stats: self.stats,
        }
    }

    /// The requested aspects; fails if any of them has never been stored.
    pub fn select(&self, requested: ICListenAspects) -> Result<SetICListenConfigurationPayload> {
        let missing = |what: &str| AcouseaError::Unavailable(format!("iClisten {what} not cached"));
        let mut selection = SetICListenConfigurationPayload::default();
        if requested.status() {
            selection.status = Some(self.status.ok_or_else(|| missing("status"))?);
        }
        if requested.logging() {
            selection.logging = Some(self.logging.ok_or_else(|| missing("logging config"))?);
        }
        if requested.streaming() {
            selection.streaming = Some(self.streaming.ok_or_else(|| missing("streaming config"))?);
        }
        if requested.stats() {
            selection.stats = Some(self.stats.ok_or_else(|| missing("recording stats"))?);
        }
        Ok(selection)
    }

    /// Every aspect at once, as carried in complete status reports.
    pub fn complete(&self) -> Result<ICListenHF> {
        let all = self.select(ICListenAspects::all())?;
        match (all.status, all.logging, all.streaming, all.stats) {
            (Some(status), Some(logging), Some(streaming), Some(stats)) => Ok(ICListenHF {
                status,
                logging,
                streaming,
                stats,
            }),
            _ => Err(AcouseaError::Unavailable("iClisten configuration incomplete".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_cache() {
        let mut cache = ICListenCache::new();
        assert!(cache.complete().is_err());

        cache.store(&SetICListenConfigurationPayload {
            status: Some(ICListenStatus::default()),
            stats: Some(ICListenRecordingStats::default()),
            ..Default::default()
        });
        assert_eq!(cache.aspects().into_bytes(), [0x09]);
        assert!(cache.select(ICListenAspects::new().with_status(true)).is_ok());
        assert!(matches!(
            cache.select(ICListenAspects::new().with_logging(true)),
            Err(AcouseaError::Unavailable(_))
        ));
        assert!(cache.complete().is_err());
    }

    #[test]
    fn test_store_keeps_other_aspects() {
        let mut cache = ICListenCache::new();
        cache.store(&SetICListenConfigurationPayload {
            status: Some(ICListenStatus::default()),
            logging: Some(ICListenLoggingConfig::default()),
            streaming: Some(ICListenStreamingConfig::default()),
            stats: Some(ICListenRecordingStats::default()),
        });
        let gain = ICListenLoggingConfig {
            gain: 12,
            ..Default::default()
        };
        cache.store(&SetICListenConfigurationPayload {
            logging: Some(gain),
            ..Default::default()
        });
        let complete = cache.complete().unwrap();
        assert_eq!(complete.logging.gain, 12);
    }
}
