use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::{signal, time};
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use acousea_lib::config::{JsonFileRepository, NodeConfigurationRepository};
use acousea_lib::module::BatteryStatus;
use acousea_lib::peripherals::{FixedBattery, FixedGps, SystemClock};
use acousea_lib::port::{PortType, QueuedPort};
use acousea_lib::{Node, Packet, Peripherals};

/// An acousea node: answers backend requests over UDP and sends scheduled status reports.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Node configuration file. Defaults are used until the first configuration update writes it.
    #[arg(short, long, default_value = "node-config.json")]
    config: PathBuf,
    /// UDP address to receive frames on.
    #[arg(short, long, default_value = "0.0.0.0:9900")]
    bind: SocketAddr,
    /// Backend address scheduled reports are sent to. Reports are only logged without it.
    #[arg(short, long)]
    peer: Option<SocketAddr>,
    /// Transport the UDP socket stands in for; limits the reply size.
    #[arg(long, value_enum, default_value_t = Transport::Sbd)]
    transport: Transport,
    /// Seconds between scheduler cycles.
    #[arg(long, default_value_t = 60)]
    tick_secs: u64,
    /// Simulated battery charge in percent.
    #[arg(long, default_value_t = 85)]
    battery: u8,
    /// Simulated latitude in degrees.
    #[arg(long, default_value_t = 28.1, allow_negative_numbers = true)]
    latitude: f32,
    /// Simulated longitude in degrees.
    #[arg(long, default_value_t = -15.4, allow_negative_numbers = true)]
    longitude: f32,
    /// Optional directory for daily rotated log files, in addition to the console.
    #[arg(short, long)]
    log_dir: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Transport {
    Lora,
    Sbd,
    Serial,
}

impl From<Transport> for PortType {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Lora => PortType::Lora,
            Transport::Sbd => PortType::Sbd,
            Transport::Serial => PortType::Serial,
        }
    }
}

fn setup_logging(log_dir: Option<&PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_thread_ids(false);

    let (file_layer, guard) = if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {:?}", dir))?;
        let appender = tracing_appender::rolling::daily(dir, "acousea-node.log");
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir {
        info!("Logging to directory: {:?}", dir);
    }

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_dir.as_ref(), &cli.verbose)?;

    tokio::select! {
        res = run(cli) => {
            if let Err(e) = res {
                error!("Node failed: {:?}", e);
                process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Ctrl+C received, shutting down gracefully.");
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let repository = JsonFileRepository::new(&cli.config);
    let config = repository.load().context("Failed to load node configuration")?;
    info!(path = ?cli.config, address = %config.local_address, "Configuration loaded");

    let peripherals = Peripherals {
        battery: Box::new(FixedBattery::new(cli.battery, BatteryStatus::Discharging)),
        gps: Box::new(FixedGps::new(cli.latitude, cli.longitude)),
        rtc: Box::new(SystemClock),
    };
    let mut node =
        Node::with_default_routines(peripherals, Box::new(repository)).context("Failed to initialise node")?;

    let socket = UdpSocket::bind(cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    info!(bind = %cli.bind, transport = ?cli.transport, "Listening");

    let mut port = QueuedPort::new(cli.transport.into());
    let mut ticker = time::interval(Duration::from_secs(cli.tick_secs.max(1)));
    let started = Instant::now();
    let mut buf = [0u8; 1024];

    loop {
        tokio::select! {
            received = socket.recv_from(&mut buf) => {
                let (len, from) = received.context("UDP receive failed")?;
                debug!(%from, len, "Frame received");
                port.receive(Bytes::copy_from_slice(&buf[..len]));
                node.drain_port(&mut port);
                for reply in port.take_sent() {
                    if let Err(e) = socket.send_to(&reply, from).await {
                        error!(%from, "Failed to send reply: {e}");
                    }
                }
            }
            _ = ticker.tick() => {
                let minute = started.elapsed().as_secs() / 60;
                if let Some(report) = node.tick(minute) {
                    send_report(&socket, cli.peer, &report).await;
                }
            }
        }
    }
}

async fn send_report(socket: &UdpSocket, peer: Option<SocketAddr>, report: &Packet) {
    let Some(peer) = peer else {
        info!(report = %report.encode_hex(), "Scheduled report (no peer configured)");
        return;
    };
    match socket.send_to(&report.to_bytes(), peer).await {
        Ok(_) => info!(%peer, op = %report.op_code(), "Scheduled report sent"),
        Err(e) => warn!(%peer, "Failed to send scheduled report: {e}"),
    }
}
