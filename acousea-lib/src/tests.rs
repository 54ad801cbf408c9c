use crate::error::AcouseaError;
use crate::module::{BatteryModule, BatteryStatus, LocationModule, ModuleCode, RtcModule};
use crate::opcode::OperationCode;
use crate::packet::{Frame, Packet};
use crate::payload::{BasicStatusReportPayload, ErrorCode, Payload};
use crate::routing::{Address, RoutingChunk};
use bytes::Bytes;

fn frame(hex_data: &str) -> Bytes {
    Bytes::from(hex::decode(hex_data).expect("Failed to decode hex"))
}

#[test]
fn test_parse_basic_status_request() {
    let packet = Packet::try_from(frame("7300050392ff")).expect("Failed to parse packet");

    assert_eq!(packet.op_code(), OperationCode::BasicStatusReport);
    assert_eq!(
        packet.routing(),
        &RoutingChunk::new(Address::BACKEND, Address::new(5), 3),
        "Routing chunk does not match"
    );
    assert_eq!(packet.payload(), &Payload::Empty);
    assert_eq!(packet.crc(), 0x92ff);
}

#[test]
fn test_parse_basic_status_answer() {
    let packet = Packet::try_from(frame("7305000342024d024c08cdcce041666676c1520800f1536500000000730e"))
        .expect("Failed to parse packet");

    assert_eq!(
        packet.payload(),
        &Payload::BasicStatusReport(BasicStatusReportPayload::new(
            BatteryModule::new(77, BatteryStatus::Charging),
            LocationModule::new(28.1, -15.4),
            RtcModule::new(1_700_000_000),
        )),
        "Parsed status does not match expected status"
    );
    assert!(packet.routing().is_uplink());
}

#[test]
fn test_build_matches_wire() {
    let packet = Packet::new(
        OperationCode::BasicStatusReport,
        RoutingChunk::from_node_to_backend(Address::new(5)),
        Payload::BasicStatusReport(BasicStatusReportPayload::new(
            BatteryModule::new(77, BatteryStatus::Charging),
            LocationModule::new(28.1, -15.4),
            RtcModule::new(1_700_000_000),
        )),
    )
    .unwrap();
    assert_eq!(
        packet.encode_hex(),
        "7305000342024d024c08cdcce041666676c1520800f1536500000000730e"
    );
}

#[test]
fn test_parse_error_report() {
    let packet = Packet::try_from(frame("4505010301ed34")).unwrap();
    let Payload::Error(error) = packet.payload() else {
        panic!("Expected error payload, got {:?}", packet.payload());
    };
    assert_eq!(error.code, ErrorCode::InvalidOpcode);
}

#[test]
fn test_get_config_request() {
    let packet = Packet::try_from(frame("5500050342f14c")).unwrap();
    let Payload::GetUpdatedNodeConfiguration(request) = packet.payload() else {
        panic!("Expected configuration request, got {:?}", packet.payload());
    };
    assert_eq!(request.requested, vec![ModuleCode::Battery]);
}

#[test]
fn test_unknown_opcode_rejected() {
    assert!(matches!(
        Packet::try_from(frame("5a00050356c6")),
        Err(AcouseaError::InvalidOperationCode(0x5a))
    ));
}

#[test]
fn test_unknown_module_survives_envelope() {
    // The envelope is sound; the bad tag is only seen once the records are decoded
    let frame = Frame::from_bytes(frame("430005034e0209009901004e58"));
    let packet = frame.packet().expect("Envelope should decode");
    let Payload::NewNodeConfiguration(update) = packet.payload() else {
        panic!("Expected configuration update, got {:?}", packet.payload());
    };
    assert!(matches!(update.modules(), Err(AcouseaError::InvalidModuleCode(0x99))));
}

#[test]
fn test_flipped_bit_rejected() {
    let mut raw = hex::decode("7300050392ff").unwrap();
    raw[3] ^= 0x01;
    let frame = Frame::from_bytes(Bytes::from(raw));
    assert!(!frame.is_valid());
    assert!(matches!(
        frame,
        Frame::Invalid {
            reason: AcouseaError::CrcMismatch { found: 0x92ff, .. },
            ..
        }
    ));
}
