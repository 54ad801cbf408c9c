//! Payload variants and their selection by operation code.

mod configuration;
mod iclisten;
mod status;

pub use configuration::{GetUpdatedNodeConfigurationPayload, NewNodeConfigurationPayload};
pub use iclisten::{FetchICListenConfigurationPayload, SetICListenConfigurationPayload};
pub use status::{BasicStatusReportPayload, CompleteStatusReportPayload};

use crate::error::{AcouseaError, Result};
use crate::opcode::OperationCode;
use crate::routing::RoutingChunk;
use bytes::Bytes;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;

/// Encode/decode contract shared by every payload variant.
pub trait PayloadCodec: Sized {
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Exact length of [`PayloadCodec::to_bytes`].
    fn bytes_size(&self) -> usize;

    fn from_bytes(data: Bytes) -> Result<Self>;
}

/// Reject buffers whose length differs from a fixed payload size.
pub(crate) fn expect_len(data: &[u8], size: usize) -> Result<()> {
    if data.len() < size {
        return Err(AcouseaError::InsufficientData {
            expected: size,
            actual: data.len(),
        });
    }
    if data.len() > size {
        return Err(AcouseaError::InvalidPayload(format!(
            "{} trailing bytes after a {size} byte payload",
            data.len() - size
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ErrorCode {
    #[strum(to_string = "invalid operation code")]
    InvalidOpcode = 0x01,
    #[strum(to_string = "invalid payload")]
    InvalidPayload = 0x02,
    #[strum(to_string = "invalid sender address")]
    InvalidSenderAddress = 0x03,
    #[strum(to_string = "invalid recipient address")]
    InvalidRecipientAddress = 0x04,
    #[strum(to_string = "invalid packet length")]
    InvalidPacketLength = 0x05,
    #[strum(to_string = "invalid sync byte")]
    InvalidSyncByte = 0x06,
}

/// Single error code byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPayload {
    pub code: ErrorCode,
}

impl ErrorPayload {
    pub const SIZE: usize = 1;

    pub fn new(code: ErrorCode) -> Self {
        Self { code }
    }
}

impl PayloadCodec for ErrorPayload {
    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(vec![self.code.into()])
    }

    fn bytes_size(&self) -> usize {
        Self::SIZE
    }

    fn from_bytes(data: Bytes) -> Result<Self> {
        expect_len(&data, Self::SIZE)?;
        let code = ErrorCode::try_from(data[0]).map_err(|_| AcouseaError::InvalidValue {
            field: "error code",
            value: data[0],
        })?;
        Ok(Self::new(code))
    }
}

/// Body of a packet, selected by its operation code.
///
/// Requests and answers share `GET_UPDATED_NODE_DEVICE_CONFIG` and `GET_ICLISTEN_CONFIG`;
/// packets addressed to the backend carry the answer variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// No body: a status report request.
    Empty,
    Error(ErrorPayload),
    BasicStatusReport(BasicStatusReportPayload),
    CompleteStatusReport(CompleteStatusReportPayload),
    GetUpdatedNodeConfiguration(GetUpdatedNodeConfigurationPayload),
    NewNodeConfiguration(NewNodeConfigurationPayload),
    UpdatedNodeConfiguration(NewNodeConfigurationPayload),
    FetchICListenConfiguration(FetchICListenConfigurationPayload),
    SetICListenConfiguration(SetICListenConfigurationPayload),
    ICListenConfiguration(SetICListenConfigurationPayload),
}

impl Payload {
    /// Decode `data` as the payload `op_code` carries in the direction given by `routing`.
    pub fn decode(op_code: OperationCode, routing: &RoutingChunk, data: Bytes) -> Result<Self> {
        let uplink = routing.is_uplink();
        Ok(match op_code {
            OperationCode::ErrorReport => Payload::Error(ErrorPayload::from_bytes(data)?),
            OperationCode::BasicStatusReport if data.is_empty() => Payload::Empty,
            OperationCode::BasicStatusReport => {
                Payload::BasicStatusReport(BasicStatusReportPayload::from_bytes(data)?)
            }
            OperationCode::CompleteStatusReport if data.is_empty() => Payload::Empty,
            OperationCode::CompleteStatusReport => {
                Payload::CompleteStatusReport(CompleteStatusReportPayload::from_bytes(data)?)
            }
            OperationCode::SetNodeDeviceConfig => {
                Payload::NewNodeConfiguration(NewNodeConfigurationPayload::from_bytes(data)?)
            }
            OperationCode::GetUpdatedNodeDeviceConfig if uplink => {
                Payload::UpdatedNodeConfiguration(NewNodeConfigurationPayload::from_bytes(data)?)
            }
            OperationCode::GetUpdatedNodeDeviceConfig => {
                Payload::GetUpdatedNodeConfiguration(GetUpdatedNodeConfigurationPayload::from_bytes(data)?)
            }
            OperationCode::GetICListenConfig if uplink => {
                Payload::ICListenConfiguration(SetICListenConfigurationPayload::from_bytes(data)?)
            }
            OperationCode::GetICListenConfig => {
                Payload::FetchICListenConfiguration(FetchICListenConfigurationPayload::from_bytes(data)?)
            }
            OperationCode::SetICListenConfig => {
                Payload::SetICListenConfiguration(SetICListenConfigurationPayload::from_bytes(data)?)
            }
        })
    }

    /// Whether [`Payload::decode`] would produce this variant for `op_code` and `routing`.
    pub fn fits(&self, op_code: OperationCode, routing: &RoutingChunk) -> bool {
        let uplink = routing.is_uplink();
        match self {
            Payload::Empty => matches!(
                op_code,
                OperationCode::BasicStatusReport | OperationCode::CompleteStatusReport
            ),
            Payload::Error(_) => op_code == OperationCode::ErrorReport,
            Payload::BasicStatusReport(_) => op_code == OperationCode::BasicStatusReport,
            Payload::CompleteStatusReport(_) => op_code == OperationCode::CompleteStatusReport,
            Payload::GetUpdatedNodeConfiguration(_) => {
                op_code == OperationCode::GetUpdatedNodeDeviceConfig && !uplink
            }
            Payload::NewNodeConfiguration(_) => op_code == OperationCode::SetNodeDeviceConfig,
            Payload::UpdatedNodeConfiguration(_) => op_code == OperationCode::GetUpdatedNodeDeviceConfig && uplink,
            Payload::FetchICListenConfiguration(_) => op_code == OperationCode::GetICListenConfig && !uplink,
            Payload::SetICListenConfiguration(_) => op_code == OperationCode::SetICListenConfig,
            Payload::ICListenConfiguration(_) => op_code == OperationCode::GetICListenConfig && uplink,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Payload::Empty => Ok(Vec::new()),
            Payload::Error(p) => p.to_bytes(),
            Payload::BasicStatusReport(p) => p.to_bytes(),
            Payload::CompleteStatusReport(p) => p.to_bytes(),
            Payload::GetUpdatedNodeConfiguration(p) => p.to_bytes(),
            Payload::NewNodeConfiguration(p) | Payload::UpdatedNodeConfiguration(p) => p.to_bytes(),
            Payload::FetchICListenConfiguration(p) => p.to_bytes(),
            Payload::SetICListenConfiguration(p) | Payload::ICListenConfiguration(p) => p.to_bytes(),
        }
    }

    pub fn bytes_size(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Error(p) => p.bytes_size(),
            Payload::BasicStatusReport(p) => p.bytes_size(),
            Payload::CompleteStatusReport(p) => p.bytes_size(),
            Payload::GetUpdatedNodeConfiguration(p) => p.bytes_size(),
            Payload::NewNodeConfiguration(p) | Payload::UpdatedNodeConfiguration(p) => p.bytes_size(),
            Payload::FetchICListenConfiguration(p) => p.bytes_size(),
            Payload::SetICListenConfiguration(p) | Payload::ICListenConfiguration(p) => p.bytes_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Address;

    #[test]
    fn test_error_payload() {
        let payload = ErrorPayload::from_bytes(Bytes::from_static(&[0x02])).unwrap();
        assert_eq!(payload.code, ErrorCode::InvalidPayload);
        assert_eq!(payload.to_bytes().unwrap(), vec![0x02]);
    }

    #[test]
    fn test_error_payload_sizes() {
        assert!(matches!(
            ErrorPayload::from_bytes(Bytes::new()),
            Err(AcouseaError::InsufficientData { expected: 1, actual: 0 })
        ));
        assert!(matches!(
            ErrorPayload::from_bytes(Bytes::from_static(&[1, 2])),
            Err(AcouseaError::InvalidPayload(_))
        ));
        assert!(matches!(
            ErrorPayload::from_bytes(Bytes::from_static(&[0x07])),
            Err(AcouseaError::InvalidValue { value: 7, .. })
        ));
    }

    #[test]
    fn test_direction_selects_variant() {
        let down = RoutingChunk::from_backend_to_node(Address::new(5));
        let up = RoutingChunk::from_node_to_backend(Address::new(5));
        let data = Bytes::from_static(&[b'B']);

        let request = Payload::decode(OperationCode::GetUpdatedNodeDeviceConfig, &down, data.clone()).unwrap();
        assert!(matches!(request, Payload::GetUpdatedNodeConfiguration(_)));
        assert!(request.fits(OperationCode::GetUpdatedNodeDeviceConfig, &down));
        assert!(!request.fits(OperationCode::GetUpdatedNodeDeviceConfig, &up));

        // A lone tag byte is a truncated module, not a code list, on the way up
        assert!(Payload::decode(OperationCode::GetUpdatedNodeDeviceConfig, &up, data).is_err());
    }

    #[test]
    fn test_empty_status_request() {
        let down = RoutingChunk::from_backend_to_node(Address::new(5));
        let payload = Payload::decode(OperationCode::BasicStatusReport, &down, Bytes::new()).unwrap();
        assert_eq!(payload, Payload::Empty);
        assert_eq!(payload.bytes_size(), 0);
        assert!(!Payload::Empty.fits(OperationCode::SetNodeDeviceConfig, &down));
    }
}
