use acousea_lib::crc;
use acousea_lib::module::{ICListenAspects, ModuleCode};
use acousea_lib::payload::{FetchICListenConfigurationPayload, GetUpdatedNodeConfigurationPayload};
use acousea_lib::{Address, Frame, OperationCode, Packet, Payload, RoutingChunk};
use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info};

/// Build, inspect and exchange acousea node frames.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a hex frame and print its contents.
    Decode { hex: String },
    /// Print the CRC of hex bytes and the frame with the CRC appended.
    Crc { hex: String },
    /// Print a backend request for a node as hex.
    Request {
        kind: RequestKind,
        /// Address of the target node.
        #[arg(short, long, default_value_t = 1)]
        address: u8,
        /// Module codes to ask for with `get-config`, e.g. "BLP".
        #[arg(short, long, default_value = "BLRN")]
        modules: String,
        /// Aspect mask for `iclisten` (bit 0 status, 1 logging, 2 streaming, 3 stats).
        #[arg(long, default_value_t = 0x0F)]
        aspects: u8,
    },
    /// Send a hex frame to a node over UDP and print the reply.
    Send {
        hex: String,
        /// UDP address the node daemon listens on.
        #[arg(short, long, default_value = "127.0.0.1:9900")]
        node: SocketAddr,
        /// How long to wait for the reply, in milliseconds.
        #[arg(short, long, default_value_t = 2000)]
        timeout_ms: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RequestKind {
    Status,
    Complete,
    GetConfig,
    Iclisten,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_target(false).init();

    match cli.command {
        Command::Decode { hex } => decode(&hex),
        Command::Crc { hex } => {
            let mut data = parse_hex(&hex)?;
            println!("CRC: {:#06x}", crc::calculate(&data));
            crc::append(&mut data);
            println!("Frame: {}", hex::encode(&data));
            Ok(())
        }
        Command::Request {
            kind,
            address,
            modules,
            aspects,
        } => {
            let packet = build_request(kind, Address::new(address), &modules, aspects)?;
            println!("{}", packet.encode_hex());
            Ok(())
        }
        Command::Send { hex, node, timeout_ms } => send(&hex, node, Duration::from_millis(timeout_ms)).await,
    }
}

fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace() && *c != ':').collect();
    hex::decode(&cleaned).with_context(|| format!("Invalid hex: {input}"))
}

fn print_packet(packet: &Packet) {
    println!("{packet}");
    println!("  Routing: {}", packet.routing());
    println!("  Payload: {:#?}", packet.payload());
    if let Payload::BasicStatusReport(status) = packet.payload() {
        if let Some(time) = status.rtc.datetime() {
            println!("  Clock: {time}");
        }
    }
}

fn decode(hex: &str) -> Result<()> {
    match Frame::from_bytes(Bytes::from(parse_hex(hex)?)) {
        Frame::Valid(packet) => {
            print_packet(&packet);
            Ok(())
        }
        Frame::Invalid { raw, reason } => bail!("Invalid frame ({} bytes): {reason}", raw.len()),
    }
}

fn build_request(kind: RequestKind, node: Address, modules: &str, aspects: u8) -> Result<Packet> {
    let routing = RoutingChunk::from_backend_to_node(node);
    let (op_code, payload) = match kind {
        RequestKind::Status => (OperationCode::BasicStatusReport, Payload::Empty),
        RequestKind::Complete => (OperationCode::CompleteStatusReport, Payload::Empty),
        RequestKind::GetConfig => {
            let requested = modules
                .bytes()
                .map(ModuleCode::from_value)
                .collect::<acousea_lib::Result<Vec<_>>>()?;
            (
                OperationCode::GetUpdatedNodeDeviceConfig,
                Payload::GetUpdatedNodeConfiguration(GetUpdatedNodeConfigurationPayload::new(requested)),
            )
        }
        RequestKind::Iclisten => (
            OperationCode::GetICListenConfig,
            Payload::FetchICListenConfiguration(FetchICListenConfigurationPayload::new(
                ICListenAspects::from_bytes([aspects & 0x0F]),
            )),
        ),
    };
    Ok(Packet::new(op_code, routing, payload)?)
}

async fn send(hex: &str, node: SocketAddr, wait: Duration) -> Result<()> {
    let frame = parse_hex(hex)?;
    let socket = UdpSocket::bind("0.0.0.0:0").await.context("Failed to bind UDP socket")?;
    socket.send_to(&frame, node).await.context("Failed to send frame")?;
    info!(%node, len = frame.len(), "Frame sent");

    let mut buf = [0u8; 512];
    let (len, from) = timeout(wait, socket.recv_from(&mut buf))
        .await
        .context("No reply before timeout")??;
    debug!(%from, len, "Reply received");

    match Frame::from_bytes(Bytes::copy_from_slice(&buf[..len])) {
        Frame::Valid(packet) => print_packet(&packet),
        Frame::Invalid { raw, reason } => {
            println!("Invalid reply {}: {reason}", hex::encode(&raw));
        }
    }
    Ok(())
}
