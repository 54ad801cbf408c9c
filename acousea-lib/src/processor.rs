//! Opcode dispatch.

use crate::error::{AcouseaError, Result};
use crate::opcode::OperationCode;
use crate::packet::{ErrorPacket, Packet};
use crate::routines::{
    BasicStatusReportRoutine, CompleteStatusReportRoutine, FetchICListenConfigurationRoutine,
    GetUpdatedNodeConfigurationRoutine, NodeContext, Routine, SetNodeConfigurationRoutine,
    StoreICListenConfigurationRoutine,
};
use tracing::{debug, warn};

/// Routes packets to the routine registered for their operation code.
///
/// Every inbound packet gets exactly one answer: the routine's packet, or an error packet
/// addressed back to the sender.
pub struct PacketProcessor {
    routines: [Option<Box<dyn Routine>>; OperationCode::COUNT],
}

impl Default for PacketProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketProcessor {
    /// A processor with no routines; every packet is answered with `INVALID_OPCODE`.
    pub fn new() -> Self {
        Self {
            routines: std::array::from_fn(|_| None),
        }
    }

    /// A processor with the node's standard routine set.
    pub fn with_default_routines() -> Self {
        let mut processor = Self::new();
        processor.register(OperationCode::BasicStatusReport, Box::new(BasicStatusReportRoutine));
        processor.register(OperationCode::CompleteStatusReport, Box::new(CompleteStatusReportRoutine));
        processor.register(OperationCode::SetNodeDeviceConfig, Box::new(SetNodeConfigurationRoutine));
        processor.register(
            OperationCode::GetUpdatedNodeDeviceConfig,
            Box::new(GetUpdatedNodeConfigurationRoutine),
        );
        processor.register(OperationCode::SetICListenConfig, Box::new(StoreICListenConfigurationRoutine));
        processor.register(OperationCode::GetICListenConfig, Box::new(FetchICListenConfigurationRoutine));
        processor
    }

    /// Install `routine` for `op_code`, returning the one it replaces.
    pub fn register(&mut self, op_code: OperationCode, routine: Box<dyn Routine>) -> Option<Box<dyn Routine>> {
        self.routines[op_code.index()].replace(routine)
    }

    pub fn unregister(&mut self, op_code: OperationCode) -> Option<Box<dyn Routine>> {
        self.routines[op_code.index()].take()
    }

    pub fn is_registered(&self, op_code: OperationCode) -> bool {
        self.routines[op_code.index()].is_some()
    }

    /// Run the routine for `op_code` directly, as the scheduler does without an inbound packet.
    pub fn run(
        &mut self,
        op_code: OperationCode,
        ctx: &mut NodeContext<'_>,
        input: Option<&Packet>,
    ) -> Result<Packet> {
        match self.routines[op_code.index()].as_mut() {
            Some(routine) => routine.execute(ctx, input),
            None => Err(AcouseaError::InvalidOperationCode(op_code.value())),
        }
    }

    /// Answer `packet`.
    pub fn process(&mut self, packet: &Packet, ctx: &mut NodeContext<'_>) -> Packet {
        let op_code = packet.op_code();
        let reply_routing = packet.routing().reply(ctx.local_address);
        let Some(routine) = self.routines[op_code.index()].as_mut() else {
            warn!(%op_code, "No routine registered");
            return ErrorPacket::invalid_opcode(reply_routing);
        };

        debug!(routine = routine.name(), %op_code, routing = %packet.routing(), "Dispatching");
        match routine.execute(ctx, Some(packet)) {
            Ok(reply) => reply,
            Err(AcouseaError::InvalidSender(sender)) => {
                warn!(routine = routine.name(), %op_code, %sender, "Request refused for sender");
                ErrorPacket::invalid_sender_address(reply_routing)
            }
            Err(e) => {
                warn!(routine = routine.name(), %op_code, "Routine failed: {e}");
                ErrorPacket::invalid_payload(reply_routing)
            }
        }
    }
}
