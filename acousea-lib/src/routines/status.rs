use super::{NodeContext, Routine, answer_routing};
use crate::error::{AcouseaError, Result};
use crate::module::{AmbientModule, BatteryModule, LocationModule, RtcModule, StorageModule};
use crate::opcode::OperationCode;
use crate::packet::Packet;
use crate::payload::{BasicStatusReportPayload, CompleteStatusReportPayload, Payload};
use tracing::debug;

fn require_empty(input: Option<&Packet>) -> Result<()> {
    match input.map(Packet::payload) {
        None | Some(Payload::Empty) => Ok(()),
        Some(other) => Err(AcouseaError::InvalidPayload(format!(
            "status request carries a {} byte payload",
            other.bytes_size()
        ))),
    }
}

fn battery(ctx: &NodeContext<'_>) -> BatteryModule {
    BatteryModule::new(ctx.battery.percentage(), ctx.battery.status())
}

fn location(ctx: &NodeContext<'_>) -> LocationModule {
    let fix = ctx.gps.read();
    LocationModule::new(fix.latitude, fix.longitude)
}

/// Battery, position and clock.
#[derive(Debug, Default)]
pub struct BasicStatusReportRoutine;

impl Routine for BasicStatusReportRoutine {
    fn name(&self) -> &'static str {
        "BasicStatusReportRoutine"
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, input: Option<&Packet>) -> Result<Packet> {
        require_empty(input)?;
        let payload = BasicStatusReportPayload::new(battery(ctx), location(ctx), RtcModule::new(ctx.rtc.epoch()));
        debug!(battery = %payload.battery.status, percentage = payload.battery.percentage, "Basic status");
        Packet::new(
            OperationCode::BasicStatusReport,
            answer_routing(ctx.local_address, input),
            Payload::BasicStatusReport(payload),
        )
    }
}

/// Full status including the cached iClisten state.
///
/// The node has no ambient or storage sensors, so both are reported as zero.
#[derive(Debug, Default)]
pub struct CompleteStatusReportRoutine;

impl Routine for CompleteStatusReportRoutine {
    fn name(&self) -> &'static str {
        "CompleteStatusReportRoutine"
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, input: Option<&Packet>) -> Result<Packet> {
        require_empty(input)?;
        let payload = CompleteStatusReportPayload {
            battery: battery(ctx),
            ambient: AmbientModule::new(0, 0),
            location: location(ctx),
            storage: StorageModule::new(0, 0),
            pam: ctx.iclisten.complete()?,
        };
        Packet::new(
            OperationCode::CompleteStatusReport,
            answer_routing(ctx.local_address, input),
            Payload::CompleteStatusReport(payload),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{BatteryStatus, ICListenHF};
    use crate::payload::SetICListenConfigurationPayload;
    use crate::routines::fixtures::Bench;
    use crate::routing::{Address, RoutingChunk};

    fn request(op: OperationCode) -> Packet {
        Packet::new(op, RoutingChunk::from_backend_to_node(Address::new(5)), Payload::Empty).unwrap()
    }

    #[test]
    fn test_basic_status_answer() {
        let mut bench = Bench::new();
        let inbound = request(OperationCode::BasicStatusReport);
        let reply = BasicStatusReportRoutine
            .execute(&mut bench.context(), Some(&inbound))
            .unwrap();

        assert_eq!(reply.op_code(), OperationCode::BasicStatusReport);
        assert_eq!(reply.routing().sender, Address::new(5));
        assert_eq!(reply.routing().receiver, Address::BACKEND);
        let Payload::BasicStatusReport(status) = reply.payload() else {
            panic!("Expected basic status payload, got {:?}", reply.payload());
        };
        assert_eq!(status.battery, BatteryModule::new(77, BatteryStatus::Charging));
        assert_eq!(status.location, LocationModule::new(28.1, -15.4));
        assert_eq!(status.rtc.epoch, 1_700_000_000);
    }

    #[test]
    fn test_scheduled_basic_status() {
        let mut bench = Bench::new();
        let reply = BasicStatusReportRoutine.execute(&mut bench.context(), None).unwrap();
        assert_eq!(reply.routing(), &RoutingChunk::from_node_to_backend(Address::new(5)));
    }

    #[test]
    fn test_complete_status_needs_cache() {
        let mut bench = Bench::new();
        let inbound = request(OperationCode::CompleteStatusReport);
        let result = CompleteStatusReportRoutine.execute(&mut bench.context(), Some(&inbound));
        assert!(matches!(result, Err(AcouseaError::Unavailable(_))));
    }

    #[test]
    fn test_complete_status_from_cache() {
        let mut bench = Bench::new();
        let hf = ICListenHF::default();
        bench.iclisten.store(&SetICListenConfigurationPayload {
            status: Some(hf.status),
            logging: Some(hf.logging),
            streaming: Some(hf.streaming),
            stats: Some(hf.stats),
        });
        let inbound = request(OperationCode::CompleteStatusReport);
        let reply = CompleteStatusReportRoutine
            .execute(&mut bench.context(), Some(&inbound))
            .unwrap();

        let Payload::CompleteStatusReport(status) = reply.payload() else {
            panic!("Expected complete status payload, got {:?}", reply.payload());
        };
        assert_eq!(status.pam, hf);
        assert_eq!(status.ambient, AmbientModule::new(0, 0));
        assert_eq!(reply.len(), 4 + CompleteStatusReportPayload::SIZE + 2);
    }
}
