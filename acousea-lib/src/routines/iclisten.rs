use super::{NodeContext, Routine, answer_routing, require_backend_sender};
use crate::error::{AcouseaError, Result};
use crate::opcode::OperationCode;
use crate::packet::Packet;
use crate::payload::Payload;
use tracing::debug;

/// Stores the iClisten aspects carried by the request and echoes them back.
#[derive(Debug, Default)]
pub struct StoreICListenConfigurationRoutine;

impl Routine for StoreICListenConfigurationRoutine {
    fn name(&self) -> &'static str {
        "StoreICListenConfigurationRoutine"
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, input: Option<&Packet>) -> Result<Packet> {
        let packet = input.ok_or(AcouseaError::MissingInput)?;
        let Payload::SetICListenConfiguration(update) = packet.payload() else {
            return Err(AcouseaError::PayloadMismatch(packet.op_code()));
        };
        ctx.iclisten.store(update);
        debug!(aspects = ?update.aspects(), "iClisten configuration stored");

        Packet::new(
            OperationCode::SetICListenConfig,
            packet.routing().reply(ctx.local_address),
            Payload::SetICListenConfiguration(*update),
        )
    }
}

/// Answers the requested iClisten aspects from the cache.
#[derive(Debug, Default)]
pub struct FetchICListenConfigurationRoutine;

impl Routine for FetchICListenConfigurationRoutine {
    fn name(&self) -> &'static str {
        "FetchICListenConfigurationRoutine"
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, input: Option<&Packet>) -> Result<Packet> {
        let packet = input.ok_or(AcouseaError::MissingInput)?;
        let Payload::FetchICListenConfiguration(request) = packet.payload() else {
            return Err(AcouseaError::PayloadMismatch(packet.op_code()));
        };
        require_backend_sender(packet)?;
        let selection = ctx.iclisten.select(request.aspects)?;

        Packet::new(
            OperationCode::GetICListenConfig,
            answer_routing(ctx.local_address, input),
            Payload::ICListenConfiguration(selection),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ICListenAspects, ICListenRecordingStats, ICListenStatus};
    use crate::payload::{FetchICListenConfigurationPayload, SetICListenConfigurationPayload};
    use crate::routines::fixtures::Bench;
    use crate::routing::{Address, RoutingChunk};

    fn store_request(update: SetICListenConfigurationPayload) -> Packet {
        Packet::new(
            OperationCode::SetICListenConfig,
            RoutingChunk::from_backend_to_node(Address::new(5)),
            Payload::SetICListenConfiguration(update),
        )
        .unwrap()
    }

    fn fetch_request(aspects: ICListenAspects) -> Packet {
        Packet::new(
            OperationCode::GetICListenConfig,
            RoutingChunk::from_backend_to_node(Address::new(5)),
            Payload::FetchICListenConfiguration(FetchICListenConfigurationPayload::new(aspects)),
        )
        .unwrap()
    }

    #[test]
    fn test_store_then_fetch() {
        let mut bench = Bench::new();
        let status = ICListenStatus {
            unit_status: 1,
            battery_percentage: 88.5,
            timestamp: 1_700_000_000,
            ..Default::default()
        };
        let update = SetICListenConfigurationPayload {
            status: Some(status),
            ..Default::default()
        };
        let echo = StoreICListenConfigurationRoutine
            .execute(&mut bench.context(), Some(&store_request(update)))
            .unwrap();
        assert_eq!(echo.payload(), &Payload::SetICListenConfiguration(update));

        let reply = FetchICListenConfigurationRoutine
            .execute(
                &mut bench.context(),
                Some(&fetch_request(ICListenAspects::new().with_status(true))),
            )
            .unwrap();
        let Payload::ICListenConfiguration(answer) = reply.payload() else {
            panic!("Expected iClisten configuration answer, got {:?}", reply.payload());
        };
        assert_eq!(answer.status, Some(status));
        assert_eq!(answer.logging, None);
    }

    #[test]
    fn test_store_keeps_other_aspects() {
        let mut bench = Bench::new();
        let stats = ICListenRecordingStats {
            epoch_time: 10,
            clicks: 3,
            minutes: 4,
            files: 5,
        };
        for update in [
            SetICListenConfigurationPayload {
                status: Some(ICListenStatus::default()),
                ..Default::default()
            },
            SetICListenConfigurationPayload {
                stats: Some(stats),
                ..Default::default()
            },
        ] {
            StoreICListenConfigurationRoutine
                .execute(&mut bench.context(), Some(&store_request(update)))
                .unwrap();
        }
        assert_eq!(bench.iclisten.aspects(), ICListenAspects::new().with_status(true).with_stats(true));
    }

    #[test]
    fn test_fetch_missing_aspect_fails() {
        let mut bench = Bench::new();
        let result = FetchICListenConfigurationRoutine.execute(
            &mut bench.context(),
            Some(&fetch_request(ICListenAspects::new().with_logging(true))),
        );
        assert!(matches!(result, Err(AcouseaError::Unavailable(_))));
    }
}
