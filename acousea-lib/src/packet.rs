use crate::constants::{CRC_SIZE, MAX_PACKET_SIZE, MIN_PACKET_SIZE, PACKET_HEADER_SIZE};
use crate::crc;
use crate::error::{AcouseaError, Result};
use crate::opcode::OperationCode;
use crate::payload::{ErrorCode, ErrorPayload, Payload};
use crate::routing::RoutingChunk;
use bytes::Bytes;
use std::fmt;

/// A validated packet: `[op][sender][receiver][ttl][payload][crc16 BE]`.
///
/// The wire form is computed once on construction, so a `Packet` always encodes to the same
/// bytes and always carries a matching CRC.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    op_code: OperationCode,
    routing: RoutingChunk,
    payload: Payload,
    crc: u16,
    wire: Bytes,
}

impl Packet {
    pub fn new(op_code: OperationCode, routing: RoutingChunk, payload: Payload) -> Result<Self> {
        if !payload.fits(op_code, &routing) {
            return Err(AcouseaError::PayloadMismatch(op_code));
        }
        let mut body = Vec::with_capacity(PACKET_HEADER_SIZE + payload.bytes_size() + CRC_SIZE);
        body.push(op_code.value());
        body.extend_from_slice(&routing.to_bytes());
        body.extend_from_slice(&payload.to_bytes()?);

        let size = body.len() + CRC_SIZE;
        if size > MAX_PACKET_SIZE {
            return Err(AcouseaError::PacketTooLarge {
                size,
                max: MAX_PACKET_SIZE,
            });
        }
        Ok(Self::seal(op_code, routing, payload, body))
    }

    fn seal(op_code: OperationCode, routing: RoutingChunk, payload: Payload, mut body: Vec<u8>) -> Self {
        let crc = crc::calculate(&body);
        body.extend_from_slice(&crc.to_be_bytes());
        Self {
            op_code,
            routing,
            payload,
            crc,
            wire: Bytes::from(body),
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::try_from(Bytes::copy_from_slice(data))
    }

    pub fn op_code(&self) -> OperationCode {
        self.op_code
    }

    pub fn routing(&self) -> &RoutingChunk {
        &self.routing
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn crc(&self) -> u16 {
        self.crc
    }

    /// Wire bytes including the trailing CRC.
    pub fn to_bytes(&self) -> Bytes {
        self.wire.clone()
    }

    pub fn len(&self) -> usize {
        self.wire.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wire.is_empty()
    }

    /// Lowercase hex rendering of the wire bytes.
    pub fn encode_hex(&self) -> String {
        hex::encode(&self.wire)
    }
}

impl TryFrom<Bytes> for Packet {
    type Error = AcouseaError;

    fn try_from(data: Bytes) -> Result<Self> {
        if data.len() < MIN_PACKET_SIZE {
            return Err(AcouseaError::InsufficientData {
                expected: MIN_PACKET_SIZE,
                actual: data.len(),
            });
        }
        if data.len() > MAX_PACKET_SIZE {
            return Err(AcouseaError::PacketTooLarge {
                size: data.len(),
                max: MAX_PACKET_SIZE,
            });
        }

        let op_code = OperationCode::from_value(data[0])?;
        let routing = RoutingChunk::from_bytes(&data[1..PACKET_HEADER_SIZE])?;

        let crc_offset = data.len() - CRC_SIZE;
        let found: [u8; CRC_SIZE] = data[crc_offset..].try_into()?;
        let found = u16::from_be_bytes(found);
        let expected = crc::calculate(&data[..crc_offset]);
        if expected != found {
            return Err(AcouseaError::CrcMismatch { expected, found });
        }

        let payload = Payload::decode(op_code, &routing, data.slice(PACKET_HEADER_SIZE..crc_offset))?;
        Ok(Self {
            op_code,
            routing,
            payload,
            crc: found,
            wire: data,
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] payload {} bytes, crc 0x{:04x}",
            self.op_code,
            self.routing,
            self.payload.bytes_size(),
            self.crc
        )
    }
}

/// A raw inbound frame after validation.
///
/// Only `Valid` frames may reach a routine; anything else, including an empty buffer, is kept
/// as `Invalid` together with the reason it was rejected.
#[derive(Debug)]
pub enum Frame {
    Valid(Packet),
    Invalid { raw: Bytes, reason: AcouseaError },
}

impl Frame {
    pub fn from_bytes(raw: Bytes) -> Self {
        match Packet::try_from(raw.clone()) {
            Ok(packet) => Frame::Valid(packet),
            Err(reason) => Frame::Invalid { raw, reason },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Frame::Valid(_))
    }

    pub fn packet(&self) -> Option<&Packet> {
        match self {
            Frame::Valid(packet) => Some(packet),
            Frame::Invalid { .. } => None,
        }
    }

    pub fn into_packet(self) -> Option<Packet> {
        match self {
            Frame::Valid(packet) => Some(packet),
            Frame::Invalid { .. } => None,
        }
    }
}

/// Builders for `ERROR_REPORT` packets.
pub struct ErrorPacket;

impl ErrorPacket {
    pub fn new(routing: RoutingChunk, code: ErrorCode) -> Packet {
        let mut body = Vec::with_capacity(PACKET_HEADER_SIZE + ErrorPayload::SIZE);
        body.push(OperationCode::ErrorReport.value());
        body.extend_from_slice(&routing.to_bytes());
        body.push(code.into());
        Packet::seal(
            OperationCode::ErrorReport,
            routing,
            Payload::Error(ErrorPayload::new(code)),
            body,
        )
    }

    pub fn invalid_opcode(routing: RoutingChunk) -> Packet {
        Self::new(routing, ErrorCode::InvalidOpcode)
    }

    pub fn invalid_payload(routing: RoutingChunk) -> Packet {
        Self::new(routing, ErrorCode::InvalidPayload)
    }

    pub fn invalid_sender_address(routing: RoutingChunk) -> Packet {
        Self::new(routing, ErrorCode::InvalidSenderAddress)
    }

    pub fn invalid_recipient_address(routing: RoutingChunk) -> Packet {
        Self::new(routing, ErrorCode::InvalidRecipientAddress)
    }

    pub fn invalid_packet_length(routing: RoutingChunk) -> Packet {
        Self::new(routing, ErrorCode::InvalidPacketLength)
    }

    pub fn invalid_sync_byte(routing: RoutingChunk) -> Packet {
        Self::new(routing, ErrorCode::InvalidSyncByte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Address;

    #[test]
    fn test_error_packet_bytes() {
        let routing = RoutingChunk::from_node_to_backend(Address::new(0x01));
        let packet = ErrorPacket::invalid_opcode(routing);
        let bytes = packet.to_bytes();
        assert_eq!(&bytes[..5], &[b'E', 0x01, 0x00, 0x03, 0x01]);
        assert!(crc::verify(&bytes));
        assert_eq!(Packet::decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn test_payload_mismatch() {
        let routing = RoutingChunk::from_backend_to_node(Address::new(2));
        assert!(matches!(
            Packet::new(OperationCode::SetNodeDeviceConfig, routing, Payload::Empty),
            Err(AcouseaError::PayloadMismatch(OperationCode::SetNodeDeviceConfig))
        ));
    }

    #[test]
    fn test_too_short() {
        match Packet::decode(&[b's', 1, 0, 3, 0xFF]) {
            Err(AcouseaError::InsufficientData { expected, actual }) => {
                assert_eq!(expected, 6);
                assert_eq!(actual, 5);
            }
            other => panic!("Expected InsufficientData, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_opcode_before_crc() {
        // Garbage CRC: the opcode check must fire first
        assert!(matches!(
            Packet::decode(&[b'X', 1, 0, 3, 0, 0]),
            Err(AcouseaError::InvalidOperationCode(b'X'))
        ));
    }

    #[test]
    fn test_crc_mismatch() {
        let packet = Packet::new(
            OperationCode::BasicStatusReport,
            RoutingChunk::from_backend_to_node(Address::new(4)),
            Payload::Empty,
        )
        .unwrap();
        let mut bytes = packet.to_bytes().to_vec();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(Packet::decode(&bytes), Err(AcouseaError::CrcMismatch { .. })));
    }

    #[test]
    fn test_empty_frame_is_invalid() {
        let frame = Frame::from_bytes(Bytes::new());
        assert!(!frame.is_valid());
        assert!(frame.packet().is_none());
    }

    #[test]
    fn test_hex_rendering() {
        let packet = ErrorPacket::invalid_payload(RoutingChunk::from_backend_to_node(Address::new(0x10)));
        let hex = packet.encode_hex();
        assert!(hex.starts_with("450010030"), "unexpected hex {hex}");
        assert_eq!(hex.len(), packet.len() * 2);
    }
}
