//! Persisted node configuration.
//!
//! JSON form:
//!
//! ```json
//! {
//!   "localAddress": 1,
//!   "routingTable": [{"destination": 9, "nextHop": 4}],
//!   "defaultGateway": 0,
//!   "operationGraphModule": [{"currentMode": 0, "nextMode": 1, "duration": 30}],
//!   "loraModule": [{"mode": 0, "period": 15, "reportType": "BASIC"}],
//!   "iridiumModule": [{"mode": 0, "period": 60, "reportType": "COMPLETE"}]
//! }
//! ```

use crate::error::{AcouseaError, Result};
use crate::module::{
    Module, NetworkModule, OperationModesGraphModule, ReportType, ReportingModule, ReportingTechnology,
};
use crate::routing::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteJson {
    destination: Address,
    next_hop: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEntryJson {
    current_mode: u8,
    next_mode: u8,
    duration: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportingEntryJson {
    mode: u8,
    period: u16,
    report_type: ReportType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeConfigurationJson {
    local_address: Address,
    #[serde(default)]
    routing_table: Vec<RouteJson>,
    #[serde(default = "backend")]
    default_gateway: Address,
    #[serde(default)]
    operation_graph_module: Vec<GraphEntryJson>,
    #[serde(default)]
    lora_module: Vec<ReportingEntryJson>,
    #[serde(default)]
    iridium_module: Vec<ReportingEntryJson>,
}

fn backend() -> Address {
    Address::BACKEND
}

/// Addressing, operation-mode graph and per-transport reporting schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NodeConfigurationJson", into = "NodeConfigurationJson")]
pub struct NodeConfiguration {
    pub local_address: Address,
    /// Static routes, destination to next hop.
    pub routing_table: BTreeMap<Address, Address>,
    pub default_gateway: Address,
    pub operation_graph: OperationModesGraphModule,
    pub lora: ReportingModule,
    pub iridium: ReportingModule,
}

impl Default for NodeConfiguration {
    fn default() -> Self {
        Self {
            local_address: Address::BROADCAST,
            routing_table: BTreeMap::new(),
            default_gateway: Address::BACKEND,
            operation_graph: OperationModesGraphModule::new().with_transition(0, 0, 1),
            lora: ReportingModule::new(ReportingTechnology::Lora).with_entry(0, 15, ReportType::Basic),
            iridium: ReportingModule::new(ReportingTechnology::Iridium).with_entry(0, 15, ReportType::Basic),
        }
    }
}

impl NodeConfiguration {
    pub fn validate(&self) -> Result<()> {
        self.operation_graph.validate()?;
        if self.lora.technology != ReportingTechnology::Lora {
            return Err(AcouseaError::Config("LoRa schedule carries another technology".to_string()));
        }
        if self.iridium.technology != ReportingTechnology::Iridium {
            return Err(AcouseaError::Config(
                "Iridium schedule carries another technology".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply one configuration module. Modules that do not describe configuration are rejected.
    pub fn apply(&mut self, module: &Module) -> Result<()> {
        match module {
            Module::Network(network) => {
                self.local_address = network.local_address;
                self.routing_table = network.routing_table.clone();
                self.default_gateway = network.default_gateway;
            }
            Module::OperationModesGraph(graph) => self.operation_graph = graph.clone(),
            Module::Reporting(reporting) => match reporting.technology {
                ReportingTechnology::Lora => self.lora = reporting.clone(),
                ReportingTechnology::Iridium => self.iridium = reporting.clone(),
            },
            other => {
                return Err(AcouseaError::InvalidPayload(format!(
                    "module {} is not a configuration module",
                    other.code()
                )));
            }
        }
        Ok(())
    }

    /// A copy with every module applied and validated; `self` is untouched on failure.
    pub fn with_modules(&self, modules: &[Module]) -> Result<Self> {
        let mut updated = self.clone();
        for module in modules {
            updated.apply(module)?;
        }
        updated.validate()?;
        Ok(updated)
    }

    pub fn network_module(&self) -> NetworkModule {
        NetworkModule {
            local_address: self.local_address,
            routing_table: self.routing_table.clone(),
            default_gateway: self.default_gateway,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn reporting_from_json(technology: ReportingTechnology, entries: Vec<ReportingEntryJson>) -> Result<ReportingModule> {
    let mut module = ReportingModule::new(technology);
    for entry in entries {
        if module.entries.contains_key(&entry.mode) {
            return Err(AcouseaError::Config(format!(
                "{technology} schedule lists mode {} twice",
                entry.mode
            )));
        }
        module = module.with_entry(entry.mode, entry.period, entry.report_type);
    }
    Ok(module)
}

fn reporting_to_json(module: ReportingModule) -> Vec<ReportingEntryJson> {
    module
        .entries
        .into_iter()
        .map(|(mode, entry)| ReportingEntryJson {
            mode,
            period: entry.period,
            report_type: entry.report_type,
        })
        .collect()
}

impl TryFrom<NodeConfigurationJson> for NodeConfiguration {
    type Error = AcouseaError;

    fn try_from(json: NodeConfigurationJson) -> Result<Self> {
        let mut operation_graph = OperationModesGraphModule::new();
        for entry in json.operation_graph_module {
            if operation_graph.graph.contains_key(&entry.current_mode) {
                return Err(AcouseaError::Config(format!(
                    "operation graph lists mode {} twice",
                    entry.current_mode
                )));
            }
            operation_graph = operation_graph.with_transition(entry.current_mode, entry.next_mode, entry.duration);
        }
        let mut network = NetworkModule::new(json.local_address, json.default_gateway);
        for route in json.routing_table {
            if network.routing_table.contains_key(&route.destination) {
                return Err(AcouseaError::Config(format!(
                    "routing table lists {} twice",
                    route.destination
                )));
            }
            network = network.with_route(route.destination, route.next_hop);
        }
        let config = Self {
            local_address: network.local_address,
            routing_table: network.routing_table,
            default_gateway: network.default_gateway,
            operation_graph,
            lora: reporting_from_json(ReportingTechnology::Lora, json.lora_module)?,
            iridium: reporting_from_json(ReportingTechnology::Iridium, json.iridium_module)?,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<NodeConfiguration> for NodeConfigurationJson {
    fn from(config: NodeConfiguration) -> Self {
        Self {
            local_address: config.local_address,
            routing_table: config
                .routing_table
                .into_iter()
                .map(|(destination, next_hop)| RouteJson { destination, next_hop })
                .collect(),
            default_gateway: config.default_gateway,
            operation_graph_module: config
                .operation_graph
                .graph
                .into_iter()
                .map(|(current_mode, transition)| GraphEntryJson {
                    current_mode,
                    next_mode: transition.next_mode,
                    duration: transition.duration,
                })
                .collect(),
            lora_module: reporting_to_json(config.lora),
            iridium_module: reporting_to_json(config.iridium),
        }
    }
}

/// Where the node configuration lives between boots.
pub trait NodeConfigurationRepository {
    fn load(&self) -> Result<NodeConfiguration>;

    fn save(&mut self, config: &NodeConfiguration) -> Result<()>;
}

/// Configuration held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    config: NodeConfiguration,
    read_only: bool,
}

impl InMemoryRepository {
    pub fn new(config: NodeConfiguration) -> Self {
        Self {
            config,
            read_only: false,
        }
    }

    /// A repository whose `save` always fails, as a full or missing SD card would.
    pub fn read_only(config: NodeConfiguration) -> Self {
        Self {
            config,
            read_only: true,
        }
    }
}

impl NodeConfigurationRepository for InMemoryRepository {
    fn load(&self) -> Result<NodeConfiguration> {
        Ok(self.config.clone())
    }

    fn save(&mut self, config: &NodeConfiguration) -> Result<()> {
        if self.read_only {
            return Err(AcouseaError::Config("repository is read-only".to_string()));
        }
        self.config = config.clone();
        Ok(())
    }
}

/// Configuration stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NodeConfigurationRepository for JsonFileRepository {
    fn load(&self) -> Result<NodeConfiguration> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "Configuration file missing, using defaults");
            return Ok(NodeConfiguration::default());
        }
        let json = fs::read_to_string(&self.path)?;
        NodeConfiguration::from_json(&json)
    }

    fn save(&mut self, config: &NodeConfiguration) -> Result<()> {
        config.validate()?;
        let json = config.to_json()?;
        // Staged write, renamed over the target
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }
}
