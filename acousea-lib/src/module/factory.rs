use super::{Module, SerializableModule};
use crate::constants::MODULE_HEADER_SIZE;
use crate::error::{AcouseaError, Result};
use bytes::Bytes;
use tracing::trace;

/// Turns flat buffers of back-to-back TLV records into typed modules.
pub struct ModuleFactory;

impl ModuleFactory {
    /// Decode the single record at the front of `buf`, advancing past it.
    pub fn create_module(buf: &mut Bytes) -> Result<Module> {
        let record = SerializableModule::parse(buf)?;
        trace!(code = %record.code(), len = record.value().len(), "Decoding module");
        Module::from_serializable(&record)
    }

    /// Decode records until `data` is exhausted.
    ///
    /// Parsing is greedy and strictly sequential; a truncated or undecodable record anywhere
    /// fails the whole buffer.
    pub fn create_modules(mut data: Bytes) -> Result<Vec<Module>> {
        let mut modules = Vec::new();
        while !data.is_empty() {
            modules.push(Self::create_module(&mut data)?);
        }
        Ok(modules)
    }

    /// Walk the tag/length framing of `data` without decoding values or tags.
    ///
    /// Returns the number of records.
    pub fn check_framing(data: &[u8]) -> Result<usize> {
        let mut offset = 0;
        let mut count = 0;
        while offset < data.len() {
            let remaining = data.len() - offset;
            if remaining < MODULE_HEADER_SIZE {
                return Err(AcouseaError::InsufficientData {
                    expected: MODULE_HEADER_SIZE,
                    actual: remaining,
                });
            }
            let record_len = MODULE_HEADER_SIZE + data[offset + 1] as usize;
            if remaining < record_len {
                return Err(AcouseaError::InsufficientData {
                    expected: record_len,
                    actual: remaining,
                });
            }
            offset += record_len;
            count += 1;
        }
        Ok(count)
    }

    /// Encode `modules` back to back.
    pub fn encode_modules(modules: &[Module]) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(modules.iter().map(Module::encoded_len).sum());
        for module in modules {
            module.encode_into(&mut buf)?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{AmbientModule, BatteryModule, BatteryStatus, ModuleCode};

    #[test]
    fn test_sequential_modules() {
        let data = Bytes::from_static(&[b'B', 2, 90, 4, b'T', 2, 18, 65]);
        let modules = ModuleFactory::create_modules(data).unwrap();
        assert_eq!(
            modules,
            vec![
                Module::Battery(BatteryModule::new(90, BatteryStatus::Full)),
                Module::Ambient(AmbientModule::new(18, 65)),
            ]
        );
    }

    #[test]
    fn test_truncated_trailing_module() {
        // Second record declares 2 bytes but carries 1
        let data = Bytes::from_static(&[b'B', 2, 90, 4, b'T', 2, 18]);
        assert!(matches!(
            ModuleFactory::create_modules(data),
            Err(AcouseaError::InsufficientData { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_dangling_tag() {
        let data = Bytes::from_static(&[b'B', 2, 90, 4, b'T']);
        assert!(matches!(
            ModuleFactory::create_modules(data),
            Err(AcouseaError::InsufficientData { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_unknown_tag() {
        let data = Bytes::from_static(&[0x99, 1, 0]);
        assert!(matches!(
            ModuleFactory::create_modules(data),
            Err(AcouseaError::InvalidModuleCode(0x99))
        ));
    }

    #[test]
    fn test_empty_buffer() {
        assert!(ModuleFactory::create_modules(Bytes::new()).unwrap().is_empty());
    }

    #[test]
    fn test_framing_ignores_tags() {
        assert_eq!(ModuleFactory::check_framing(&[0x99, 1, 0, b'T', 0]).unwrap(), 2);
        assert!(ModuleFactory::check_framing(&[0x99, 3, 0]).is_err());
    }

    #[test]
    fn test_encode_modules() {
        let modules = vec![Module::Ambient(AmbientModule::new(1, 2))];
        let bytes = ModuleFactory::encode_modules(&modules).unwrap();
        assert_eq!(bytes, vec![ModuleCode::Ambient.value(), 2, 1, 2]);
    }
}
