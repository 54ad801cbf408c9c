pub mod cache;
pub mod config;
pub mod constants;
pub mod crc;
pub mod error;
pub mod module;
pub mod opcode;
pub mod packet;
pub mod payload;
pub mod peripherals;
pub mod port;
pub mod processor;
pub mod queue;
pub mod routines;
pub mod routing;
pub mod runner;

#[cfg(test)]
mod tests;

// Re-export the types most callers need
pub use error::{AcouseaError, Result};
pub use opcode::OperationCode;
pub use packet::{ErrorPacket, Frame, Packet};
pub use payload::Payload;
pub use processor::PacketProcessor;
pub use routing::{Address, RoutingChunk};
pub use runner::{Node, Peripherals};
