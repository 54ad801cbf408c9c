use crate::constants::{LORA_MAX_PACKET_SIZE, MAX_PACKET_SIZE};
use crate::error::Result;
use crate::queue::ReceiveQueue;
use bytes::Bytes;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum PortType {
    #[strum(to_string = "LoRa")]
    Lora,
    #[strum(to_string = "Iridium SBD")]
    Sbd,
    #[strum(to_string = "serial")]
    Serial,
}

impl PortType {
    /// Largest frame the transport accepts.
    pub fn max_frame_len(self) -> usize {
        match self {
            PortType::Lora => LORA_MAX_PACKET_SIZE,
            PortType::Sbd | PortType::Serial => MAX_PACKET_SIZE,
        }
    }
}

/// A byte transport.
pub trait Port {
    fn port_type(&self) -> PortType;

    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Whether frames are waiting to be read.
    fn available(&self) -> bool;

    /// Take every buffered inbound frame, oldest first.
    fn read(&mut self) -> Vec<Bytes>;
}

/// Port backed by a [`ReceiveQueue`] for inbound frames and an outbox for sent ones.
///
/// Transport drivers push what they receive with [`QueuedPort::receive`] and flush
/// [`QueuedPort::take_sent`] to the medium.
#[derive(Debug)]
pub struct QueuedPort {
    port_type: PortType,
    inbound: ReceiveQueue,
    outbox: Vec<Bytes>,
}

impl QueuedPort {
    pub fn new(port_type: PortType) -> Self {
        Self {
            port_type,
            inbound: ReceiveQueue::new(),
            outbox: Vec::new(),
        }
    }

    pub fn receive(&mut self, frame: Bytes) {
        self.inbound.push(frame);
    }

    pub fn take_sent(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.outbox)
    }

    pub fn queue(&self) -> &ReceiveQueue {
        &self.inbound
    }
}

impl Port for QueuedPort {
    fn port_type(&self) -> PortType {
        self.port_type
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.outbox.push(Bytes::copy_from_slice(frame));
        Ok(())
    }

    fn available(&self) -> bool {
        !self.inbound.is_empty()
    }

    fn read(&mut self) -> Vec<Bytes> {
        self.inbound.take_all()
    }
}
