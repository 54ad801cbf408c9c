use crate::constants::{DEFAULT_TTL, ROUTING_CHUNK_SIZE};
use crate::error::{AcouseaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One-byte node address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(u8);

impl Address {
    pub const BACKEND: Address = Address(0x00);
    pub const BROADCAST: Address = Address(0xFF);

    pub const fn new(value: u8) -> Self {
        Address(value)
    }

    /// Build an address from a wider integer, rejecting anything outside a byte.
    pub fn from_value(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map(Address)
            .map_err(|_| AcouseaError::OutOfRange(value))
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub fn is_backend(self) -> bool {
        self == Self::BACKEND
    }

    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }

    pub fn is_reserved(self) -> bool {
        self.is_backend() || self.is_broadcast()
    }
}

impl From<u8> for Address {
    fn from(value: u8) -> Self {
        Address(value)
    }
}

impl From<Address> for u8 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Address::BACKEND => write!(f, "backend"),
            Address::BROADCAST => write!(f, "broadcast"),
            Address(value) => write!(f, "0x{value:02x}"),
        }
    }
}

/// Sender, receiver and hop budget carried by every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingChunk {
    pub sender: Address,
    pub receiver: Address,
    pub ttl: u8,
}

impl RoutingChunk {
    pub fn new(sender: Address, receiver: Address, ttl: u8) -> Self {
        Self {
            sender,
            receiver,
            ttl,
        }
    }

    pub fn from_backend_to_node(receiver: Address) -> Self {
        Self::new(Address::BACKEND, receiver, DEFAULT_TTL)
    }

    pub fn from_node_to_backend(sender: Address) -> Self {
        Self::new(sender, Address::BACKEND, DEFAULT_TTL)
    }

    pub fn broadcast_from(sender: Address) -> Self {
        Self::new(sender, Address::BROADCAST, DEFAULT_TTL)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < ROUTING_CHUNK_SIZE {
            return Err(AcouseaError::InsufficientData {
                expected: ROUTING_CHUNK_SIZE,
                actual: data.len(),
            });
        }
        Ok(Self::new(data[0].into(), data[1].into(), data[2]))
    }

    pub fn to_bytes(&self) -> [u8; ROUTING_CHUNK_SIZE] {
        [self.sender.value(), self.receiver.value(), self.ttl]
    }

    pub fn swap_sender_receiver(&mut self) {
        std::mem::swap(&mut self.sender, &mut self.receiver);
    }

    /// Routing for an answer to a packet that arrived with this chunk.
    ///
    /// Sender and receiver are swapped and the TTL is reset. A packet that was broadcast
    /// is answered from `local` so the reply never claims the broadcast address as sender.
    pub fn reply(&self, local: Address) -> Self {
        let sender = if self.receiver.is_broadcast() {
            local
        } else {
            self.receiver
        };
        Self::new(sender, self.sender, DEFAULT_TTL)
    }

    /// Whether the packet travels towards the backend.
    pub fn is_uplink(&self) -> bool {
        self.receiver.is_backend()
    }
}

impl fmt::Display for RoutingChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} (ttl {})", self.sender, self.receiver, self.ttl)
    }
}
