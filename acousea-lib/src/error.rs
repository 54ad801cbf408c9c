use std::array::TryFromSliceError;
use std::io;
use thiserror::Error;

use crate::module::ModuleCode;
use crate::opcode::OperationCode;
use crate::routing::Address;

/// The primary error type for the `acousea-lib` library.
#[derive(Error, Debug)]
pub enum AcouseaError {
    #[error("Address value {0} is outside [0, 255]")]
    OutOfRange(i64),

    #[error("Insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Invalid operation code: 0x{0:02x}")]
    InvalidOperationCode(u8),

    #[error("Invalid module code: 0x{0:02x}")]
    InvalidModuleCode(u8),

    #[error("Invalid report type: 0x{0:02x}")]
    InvalidReportType(u8),

    #[error("Invalid {field} value: {value}")]
    InvalidValue { field: &'static str, value: u8 },

    #[error("CRC mismatch: expected 0x{expected:04x}, found 0x{found:04x}")]
    CrcMismatch { expected: u16, found: u16 },

    #[error("Module {code} has an invalid length: expected {expected} bytes, got {actual}")]
    ModuleLength {
        code: ModuleCode,
        expected: usize,
        actual: usize,
    },

    #[error("Module value of {0} bytes does not fit a one-byte length field")]
    ModuleTooLarge(usize),

    #[error("Packet of {size} bytes exceeds the {max} byte limit")]
    PacketTooLarge { size: usize, max: usize },

    #[error("Payload does not match operation code {0}")]
    PayloadMismatch(OperationCode),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Sender {0} may not issue this request")]
    InvalidSender(Address),

    #[error("Routine requires an input packet")]
    MissingInput,

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<TryFromSliceError> for AcouseaError {
    fn from(_: TryFromSliceError) -> Self {
        AcouseaError::InvalidPayload("Failed to convert slice to array".to_string())
    }
}

pub type Result<T> = std::result::Result<T, AcouseaError>;
