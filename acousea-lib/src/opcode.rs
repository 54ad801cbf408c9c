use crate::error::{AcouseaError, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display;

/// One-byte tag selecting the semantics of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OperationCode {
    #[strum(to_string = "ERROR_REPORT")]
    ErrorReport = b'E',
    #[strum(to_string = "COMPLETE_STATUS_REPORT")]
    CompleteStatusReport = b'S',
    #[strum(to_string = "BASIC_STATUS_REPORT")]
    BasicStatusReport = b's',
    #[strum(to_string = "SET_NODE_DEVICE_CONFIG")]
    SetNodeDeviceConfig = b'C',
    #[strum(to_string = "GET_UPDATED_NODE_DEVICE_CONFIG")]
    GetUpdatedNodeDeviceConfig = b'U',
    #[strum(to_string = "GET_ICLISTEN_CONFIG")]
    GetICListenConfig = b'I',
    #[strum(to_string = "SET_ICLISTEN_CONFIG")]
    SetICListenConfig = b'i',
}

impl OperationCode {
    /// Every operation code, in routine-table order.
    pub const ALL: [OperationCode; 7] = [
        OperationCode::ErrorReport,
        OperationCode::CompleteStatusReport,
        OperationCode::BasicStatusReport,
        OperationCode::SetNodeDeviceConfig,
        OperationCode::GetUpdatedNodeDeviceConfig,
        OperationCode::GetICListenConfig,
        OperationCode::SetICListenConfig,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn from_value(value: u8) -> Result<Self> {
        Self::try_from(value).map_err(|_| AcouseaError::InvalidOperationCode(value))
    }

    pub fn value(self) -> u8 {
        self.into()
    }

    /// Dense index into [`OperationCode::ALL`].
    pub fn index(self) -> usize {
        match self {
            OperationCode::ErrorReport => 0,
            OperationCode::CompleteStatusReport => 1,
            OperationCode::BasicStatusReport => 2,
            OperationCode::SetNodeDeviceConfig => 3,
            OperationCode::GetUpdatedNodeDeviceConfig => 4,
            OperationCode::GetICListenConfig => 5,
            OperationCode::SetICListenConfig => 6,
        }
    }
}
