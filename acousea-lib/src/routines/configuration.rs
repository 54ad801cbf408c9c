use super::{NodeContext, Routine, answer_routing, require_backend_sender};
use crate::config::NodeConfiguration;
use crate::error::{AcouseaError, Result};
use crate::module::{
    AmbientModule, BatteryModule, ICListenAspects, LocationModule, Module, ModuleCode, ModuleValue,
    OperationModesModule, PamModule, RtcModule, StorageModule,
};
use crate::opcode::OperationCode;
use crate::packet::Packet;
use crate::payload::{NewNodeConfigurationPayload, Payload};
use bytes::Bytes;
use tracing::{debug, info};

/// Applies a backend configuration update and echoes it back.
///
/// The update is applied to a copy of the stored configuration and persisted only when every
/// module decoded and the result validated, so a rejected update changes nothing.
#[derive(Debug, Default)]
pub struct SetNodeConfigurationRoutine;

impl Routine for SetNodeConfigurationRoutine {
    fn name(&self) -> &'static str {
        "SetNodeConfigurationRoutine"
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, input: Option<&Packet>) -> Result<Packet> {
        let packet = input.ok_or(AcouseaError::MissingInput)?;
        let Payload::NewNodeConfiguration(update) = packet.payload() else {
            return Err(AcouseaError::PayloadMismatch(packet.op_code()));
        };
        let modules = update.modules()?;
        let updated = ctx.repository.load()?.with_modules(&modules)?;
        ctx.repository.save(&updated)?;
        info!(modules = modules.len(), address = %updated.local_address, "Node configuration updated");

        Packet::new(
            OperationCode::SetNodeDeviceConfig,
            packet.routing().reply(ctx.local_address),
            Payload::NewNodeConfiguration(update.clone()),
        )
    }
}

/// Reports the current value of each requested module.
#[derive(Debug, Default)]
pub struct GetUpdatedNodeConfigurationRoutine;

impl GetUpdatedNodeConfigurationRoutine {
    fn collect(
        ctx: &NodeContext<'_>,
        config: &NodeConfiguration,
        code: ModuleCode,
        modules: &mut Vec<Module>,
    ) -> Result<()> {
        match code {
            ModuleCode::Battery => {
                modules.push(BatteryModule::new(ctx.battery.percentage(), ctx.battery.status()).into())
            }
            ModuleCode::Location => {
                let fix = ctx.gps.read();
                modules.push(LocationModule::new(fix.latitude, fix.longitude).into());
            }
            ModuleCode::RealTimeClock => modules.push(RtcModule::new(ctx.rtc.epoch()).into()),
            ModuleCode::Network => modules.push(config.network_module().into()),
            ModuleCode::OperationModesGraph => modules.push(config.operation_graph.clone().into()),
            ModuleCode::OperationModes => {
                let modes: Vec<u8> = config.operation_graph.graph.keys().copied().collect();
                let active_index = modes.iter().position(|&mode| mode == ctx.active_mode).unwrap_or(0);
                modules.push(OperationModesModule::new(modes, active_index as u8)?.into());
            }
            // One record per transport
            ModuleCode::Reporting => {
                modules.push(config.lora.clone().into());
                modules.push(config.iridium.clone().into());
            }
            ModuleCode::Storage => modules.push(StorageModule::new(0, 0).into()),
            ModuleCode::Ambient => modules.push(AmbientModule::new(0, 0).into()),
            ModuleCode::PamModule => modules.push(
                PamModule {
                    value: Bytes::from(ctx.iclisten.complete()?.encode_value()),
                }
                .into(),
            ),
            ModuleCode::ICListenComplete => modules.push(ctx.iclisten.complete()?.into()),
            ModuleCode::ICListenStatus => modules.extend(
                ctx.iclisten
                    .select(ICListenAspects::new().with_status(true))?
                    .status
                    .map(Module::from),
            ),
            ModuleCode::ICListenLoggingConfig => modules.extend(
                ctx.iclisten
                    .select(ICListenAspects::new().with_logging(true))?
                    .logging
                    .map(Module::from),
            ),
            ModuleCode::ICListenStreamingConfig => modules.extend(
                ctx.iclisten
                    .select(ICListenAspects::new().with_streaming(true))?
                    .streaming
                    .map(Module::from),
            ),
            ModuleCode::ICListenRecordingStats => modules.extend(
                ctx.iclisten
                    .select(ICListenAspects::new().with_stats(true))?
                    .stats
                    .map(Module::from),
            ),
        }
        Ok(())
    }
}

impl Routine for GetUpdatedNodeConfigurationRoutine {
    fn name(&self) -> &'static str {
        "GetUpdatedNodeConfigurationRoutine"
    }

    fn execute(&mut self, ctx: &mut NodeContext<'_>, input: Option<&Packet>) -> Result<Packet> {
        let packet = input.ok_or(AcouseaError::MissingInput)?;
        let Payload::GetUpdatedNodeConfiguration(request) = packet.payload() else {
            return Err(AcouseaError::PayloadMismatch(packet.op_code()));
        };
        require_backend_sender(packet)?;
        let config = ctx.repository.load()?;
        let mut modules = Vec::with_capacity(request.requested.len());
        for &code in &request.requested {
            Self::collect(ctx, &config, code, &mut modules)?;
        }
        debug!(requested = request.requested.len(), modules = modules.len(), "Reporting configuration");

        Packet::new(
            OperationCode::GetUpdatedNodeDeviceConfig,
            answer_routing(ctx.local_address, input),
            Payload::UpdatedNodeConfiguration(NewNodeConfigurationPayload::new(&modules)?),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InMemoryRepository, NodeConfigurationRepository};
    use crate::module::{NetworkModule, OperationModesGraphModule, ReportType, ReportingModule, ReportingTechnology};
    use crate::payload::GetUpdatedNodeConfigurationPayload;
    use crate::routines::fixtures::Bench;
    use crate::routing::{Address, RoutingChunk};
    use std::cell::Cell;

    fn set_request(payload: NewNodeConfigurationPayload) -> Packet {
        Packet::new(
            OperationCode::SetNodeDeviceConfig,
            RoutingChunk::from_backend_to_node(Address::new(5)),
            Payload::NewNodeConfiguration(payload),
        )
        .unwrap()
    }

    #[test]
    fn test_set_configuration_persists_and_echoes() {
        let mut bench = Bench::new();
        let modules: Vec<Module> = vec![
            OperationModesGraphModule::new()
                .with_transition(0, 1, 10)
                .with_transition(1, 0, 5)
                .into(),
            ReportingModule::new(ReportingTechnology::Iridium)
                .with_entry(0, 60, ReportType::Complete)
                .with_entry(1, 30, ReportType::Basic)
                .into(),
        ];
        let inbound = set_request(NewNodeConfigurationPayload::new(&modules).unwrap());
        let reply = SetNodeConfigurationRoutine
            .execute(&mut bench.context(), Some(&inbound))
            .unwrap();

        assert_eq!(reply.payload(), inbound.payload(), "Update should be echoed unchanged");
        assert_eq!(reply.routing().receiver, Address::BACKEND);
        let stored = bench.repository.load().unwrap();
        assert_eq!(stored.operation_graph.graph.len(), 2);
        assert_eq!(stored.iridium.entries[&0].report_type, ReportType::Complete);
    }

    #[test]
    fn test_set_configuration_unknown_module_changes_nothing() {
        let mut bench = Bench::new();
        let before = bench.repository.load().unwrap();
        // A valid network record followed by an unknown tag
        let mut records = Module::from(NetworkModule::new(Address::new(9), Address::BACKEND))
            .to_serializable()
            .unwrap()
            .to_bytes();
        records.extend_from_slice(&[0x99, 1, 0]);
        let inbound = set_request(NewNodeConfigurationPayload::from_records(Bytes::from(records)).unwrap());

        let result = SetNodeConfigurationRoutine.execute(&mut bench.context(), Some(&inbound));
        assert!(matches!(result, Err(AcouseaError::InvalidModuleCode(0x99))));
        assert_eq!(bench.repository.load().unwrap(), before);
    }

    #[test]
    fn test_set_configuration_rejects_open_graph() {
        let mut bench = Bench::new();
        let modules: Vec<Module> = vec![OperationModesGraphModule::new().with_transition(0, 3, 10).into()];
        let inbound = set_request(NewNodeConfigurationPayload::new(&modules).unwrap());
        let result = SetNodeConfigurationRoutine.execute(&mut bench.context(), Some(&inbound));
        assert!(matches!(result, Err(AcouseaError::Config(_))));
    }

    #[test]
    fn test_set_configuration_needs_input() {
        let mut bench = Bench::new();
        assert!(matches!(
            SetNodeConfigurationRoutine.execute(&mut bench.context(), None),
            Err(AcouseaError::MissingInput)
        ));
    }

    #[test]
    fn test_get_updated_configuration() {
        let mut bench = Bench::new();
        let inbound = Packet::new(
            OperationCode::GetUpdatedNodeDeviceConfig,
            RoutingChunk::from_backend_to_node(Address::new(5)),
            Payload::GetUpdatedNodeConfiguration(GetUpdatedNodeConfigurationPayload::new(vec![
                ModuleCode::Battery,
                ModuleCode::Reporting,
                ModuleCode::OperationModes,
            ])),
        )
        .unwrap();
        let reply = GetUpdatedNodeConfigurationRoutine
            .execute(&mut bench.context(), Some(&inbound))
            .unwrap();

        let Payload::UpdatedNodeConfiguration(answer) = reply.payload() else {
            panic!("Expected updated configuration, got {:?}", reply.payload());
        };
        let modules = answer.modules().unwrap();
        let codes: Vec<ModuleCode> = modules.iter().map(Module::code).collect();
        assert_eq!(
            codes,
            vec![
                ModuleCode::Battery,
                ModuleCode::Reporting,
                ModuleCode::Reporting,
                ModuleCode::OperationModes
            ]
        );
        assert_eq!(modules[3], Module::OperationModes(OperationModesModule::new(vec![0], 0).unwrap()));
    }

    /// Counts how often the configuration is read.
    struct CountingRepository {
        inner: InMemoryRepository,
        loads: Cell<usize>,
    }

    impl NodeConfigurationRepository for CountingRepository {
        fn load(&self) -> Result<NodeConfiguration> {
            self.loads.set(self.loads.get() + 1);
            self.inner.load()
        }

        fn save(&mut self, config: &NodeConfiguration) -> Result<()> {
            self.inner.save(config)
        }
    }

    #[test]
    fn test_get_updated_reads_configuration_once() {
        let mut bench = Bench::new();
        let mut repository = CountingRepository {
            inner: bench.repository.clone(),
            loads: Cell::new(0),
        };
        let inbound = Packet::new(
            OperationCode::GetUpdatedNodeDeviceConfig,
            RoutingChunk::from_backend_to_node(Address::new(5)),
            Payload::GetUpdatedNodeConfiguration(GetUpdatedNodeConfigurationPayload::new(vec![
                ModuleCode::Network,
                ModuleCode::OperationModesGraph,
                ModuleCode::Reporting,
            ])),
        )
        .unwrap();
        let mut ctx = NodeContext {
            repository: &mut repository,
            ..bench.context()
        };
        GetUpdatedNodeConfigurationRoutine.execute(&mut ctx, Some(&inbound)).unwrap();
        assert_eq!(repository.loads.get(), 1);
    }

    #[test]
    fn test_get_uncached_iclisten_fails() {
        let mut bench = Bench::new();
        let inbound = Packet::new(
            OperationCode::GetUpdatedNodeDeviceConfig,
            RoutingChunk::from_backend_to_node(Address::new(5)),
            Payload::GetUpdatedNodeConfiguration(GetUpdatedNodeConfigurationPayload::new(vec![
                ModuleCode::ICListenStatus,
            ])),
        )
        .unwrap();
        assert!(matches!(
            GetUpdatedNodeConfigurationRoutine.execute(&mut bench.context(), Some(&inbound)),
            Err(AcouseaError::Unavailable(_))
        ));
    }
}
