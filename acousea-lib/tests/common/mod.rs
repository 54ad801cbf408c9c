//! Common test utilities and shared imports

// Shared by every test file; not all items are used in each
#[allow(unused_imports)]
pub use acousea_lib::config::{InMemoryRepository, JsonFileRepository, NodeConfiguration, NodeConfigurationRepository};
#[allow(unused_imports)]
pub use acousea_lib::module::{
    BatteryModule, BatteryStatus, ICListenAspects, ICListenHF, Module, ModuleCode, NetworkModule,
    OperationModesGraphModule, ReportType, ReportingModule, ReportingTechnology,
};
#[allow(unused_imports)]
pub use acousea_lib::payload::{
    ErrorCode, FetchICListenConfigurationPayload, GetUpdatedNodeConfigurationPayload, NewNodeConfigurationPayload,
    SetICListenConfigurationPayload,
};
#[allow(unused_imports)]
pub use acousea_lib::peripherals::{FixedBattery, FixedClock, FixedGps};
#[allow(unused_imports)]
pub use acousea_lib::port::{Port, PortType, QueuedPort};
#[allow(unused_imports)]
pub use acousea_lib::queue::ReceiveQueue;
#[allow(unused_imports)]
pub use acousea_lib::{
    AcouseaError, Address, ErrorPacket, Frame, Node, OperationCode, Packet, PacketProcessor, Payload, Peripherals,
    RoutingChunk,
};
#[allow(unused_imports)]
pub use bytes::Bytes;

/// Address every test node runs at.
#[allow(dead_code)]
pub const NODE: Address = Address::new(5);

/// `BASIC_STATUS_REPORT` request from the backend to node 5.
#[allow(dead_code)]
pub const BASIC_STATUS_REQUEST: &str = "7300050392ff";

/// Route library logs to the test harness; `RUST_LOG` picks the level
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

#[allow(dead_code)]
pub fn node_config() -> NodeConfiguration {
    NodeConfiguration {
        local_address: NODE,
        ..NodeConfiguration::default()
    }
}

#[allow(dead_code)]
pub fn peripherals() -> Peripherals {
    Peripherals {
        battery: Box::new(FixedBattery::new(77, BatteryStatus::Charging)),
        gps: Box::new(FixedGps::new(28.1, -15.4)),
        rtc: Box::new(FixedClock(1_700_000_000)),
    }
}

/// A node with the standard routines over `repository`.
#[allow(dead_code)]
pub fn node_with(repository: impl NodeConfigurationRepository + 'static) -> Node {
    Node::with_default_routines(peripherals(), Box::new(repository)).expect("Failed to build node")
}

#[allow(dead_code)]
pub fn request(op_code: OperationCode, payload: Payload) -> Packet {
    Packet::new(op_code, RoutingChunk::from_backend_to_node(NODE), payload).expect("Failed to build request")
}

#[allow(dead_code)]
pub fn error_code(packet: &Packet) -> ErrorCode {
    match packet.payload() {
        Payload::Error(error) => error.code,
        other => panic!("Expected error payload, got {other:?}"),
    }
}
