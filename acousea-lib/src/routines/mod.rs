//! Handlers behind each operation code.
//!
//! A routine receives the inbound packet, or `None` when the node runs it on its own schedule,
//! and builds the answer. Failures are turned into error replies by the
//! [`PacketProcessor`](crate::processor::PacketProcessor).

mod configuration;
mod iclisten;
mod status;

pub use configuration::{GetUpdatedNodeConfigurationRoutine, SetNodeConfigurationRoutine};
pub use iclisten::{FetchICListenConfigurationRoutine, StoreICListenConfigurationRoutine};
pub use status::{BasicStatusReportRoutine, CompleteStatusReportRoutine};

use crate::cache::ICListenCache;
use crate::config::NodeConfigurationRepository;
use crate::error::{AcouseaError, Result};
use crate::packet::Packet;
use crate::peripherals::{BatteryController, Gps, RealTimeClock};
use crate::routing::{Address, RoutingChunk};

/// Collaborators a routine may use while it runs.
pub struct NodeContext<'a> {
    pub local_address: Address,
    /// Operation mode the node is currently in.
    pub active_mode: u8,
    pub battery: &'a dyn BatteryController,
    pub gps: &'a dyn Gps,
    pub rtc: &'a dyn RealTimeClock,
    pub repository: &'a mut dyn NodeConfigurationRepository,
    pub iclisten: &'a mut ICListenCache,
}

pub trait Routine {
    fn name(&self) -> &'static str;

    fn execute(&mut self, ctx: &mut NodeContext<'_>, input: Option<&Packet>) -> Result<Packet>;
}

/// Routing of a routine's answer: back to the requester, or up to the backend when the node
/// reports on its own.
pub(crate) fn answer_routing(local: Address, input: Option<&Packet>) -> RoutingChunk {
    match input {
        Some(packet) => packet.routing().reply(local),
        None => RoutingChunk::from_node_to_backend(local),
    }
}

/// Queries whose answer travels uplink are only taken from the backend.
pub(crate) fn require_backend_sender(packet: &Packet) -> Result<()> {
    let sender = packet.routing().sender;
    if sender.is_backend() {
        Ok(())
    } else {
        Err(AcouseaError::InvalidSender(sender))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduled_answer_goes_to_backend() {
        let routing = answer_routing(Address::new(5), None);
        assert_eq!(routing, RoutingChunk::from_node_to_backend(Address::new(5)));
        assert!(routing.is_uplink());
    }
}
