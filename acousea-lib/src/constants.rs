// Wire constants for the acousea packet protocol

/// Size of the operation code field (1 byte)
pub const OPCODE_SIZE: usize = 1;

/// Size of the routing chunk: sender, receiver, TTL (3 bytes)
pub const ROUTING_CHUNK_SIZE: usize = 3;

/// Size of the trailing CRC-16 (2 bytes)
pub const CRC_SIZE: usize = 2;

/// Bytes preceding the payload
pub const PACKET_HEADER_SIZE: usize = OPCODE_SIZE + ROUTING_CHUNK_SIZE;

/// Smallest wire packet: header plus CRC with an empty payload
pub const MIN_PACKET_SIZE: usize = PACKET_HEADER_SIZE + CRC_SIZE;

/// Iridium SBD mobile-originated message limit, the hard cap for any packet
pub const MAX_PACKET_SIZE: usize = 340;

/// LoRa frame limit
pub const LORA_MAX_PACKET_SIZE: usize = 255;

/// Module header: tag plus one length byte
pub const MODULE_HEADER_SIZE: usize = 2;

/// Largest module value a one-byte length field can describe
pub const MAX_MODULE_VALUE_SIZE: usize = u8::MAX as usize;

/// Hop count assigned to freshly built routing chunks
pub const DEFAULT_TTL: u8 = 3;

/// Raw frames buffered per port before the oldest is dropped
pub const RECEIVE_QUEUE_CAPACITY: usize = 10;
