//! The node's main loop body: answer inbound frames and send scheduled reports.

use crate::cache::ICListenCache;
use crate::config::{NodeConfiguration, NodeConfigurationRepository};
use crate::error::{AcouseaError, Result};
use crate::module::ReportType;
use crate::opcode::OperationCode;
use crate::packet::{Frame, Packet};
use crate::payload::Payload;
use crate::peripherals::{BatteryController, Gps, RealTimeClock};
use crate::port::Port;
use crate::processor::PacketProcessor;
use crate::routines::NodeContext;
use crate::routing::Address;
use bytes::Bytes;
use tracing::{debug, error, info, warn};

/// Hardware the node reads its status from.
pub struct Peripherals {
    pub battery: Box<dyn BatteryController>,
    pub gps: Box<dyn Gps>,
    pub rtc: Box<dyn RealTimeClock>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Schedule {
    mode: u8,
    cycles: u32,
    last_report_minute: u64,
}

pub struct Node {
    peripherals: Peripherals,
    repository: Box<dyn NodeConfigurationRepository>,
    iclisten: ICListenCache,
    processor: PacketProcessor,
    schedule: Schedule,
}

impl Node {
    /// Build a node starting in the first mode of the stored operation graph.
    ///
    /// The clock is set from the GPS when it has a fix time.
    pub fn new(
        mut peripherals: Peripherals,
        repository: Box<dyn NodeConfigurationRepository>,
        processor: PacketProcessor,
    ) -> Result<Self> {
        let config = repository.load()?;
        config.validate()?;
        let mode = first_mode(&config)?;
        if config.local_address.is_reserved() {
            warn!(address = %config.local_address, "Local address is reserved, replies will carry it as sender");
        }
        let fix_time = peripherals.gps.timestamp();
        if fix_time > 0 {
            peripherals.rtc.sync(fix_time);
            info!(epoch = fix_time, "Clock synchronised from GPS");
        }
        info!(address = %config.local_address, mode, "Node initialised");
        Ok(Self {
            peripherals,
            repository,
            iclisten: ICListenCache::new(),
            processor,
            schedule: Schedule {
                mode,
                ..Default::default()
            },
        })
    }

    pub fn with_default_routines(
        peripherals: Peripherals,
        repository: Box<dyn NodeConfigurationRepository>,
    ) -> Result<Self> {
        Self::new(peripherals, repository, PacketProcessor::with_default_routines())
    }

    pub fn configuration(&self) -> Result<NodeConfiguration> {
        self.repository.load()
    }

    pub fn current_mode(&self) -> u8 {
        self.schedule.mode
    }

    pub fn iclisten(&self) -> &ICListenCache {
        &self.iclisten
    }

    pub fn processor_mut(&mut self) -> &mut PacketProcessor {
        &mut self.processor
    }

    fn parts(&mut self, local_address: Address) -> (&mut PacketProcessor, NodeContext<'_>) {
        let ctx = NodeContext {
            local_address,
            active_mode: self.schedule.mode,
            battery: self.peripherals.battery.as_ref(),
            gps: self.peripherals.gps.as_ref(),
            rtc: self.peripherals.rtc.as_ref(),
            repository: self.repository.as_mut(),
            iclisten: &mut self.iclisten,
        };
        (&mut self.processor, ctx)
    }

    /// Decode one raw frame and build the answer, if it deserves one.
    ///
    /// Invalid frames, frames addressed to another node and inbound error reports are logged
    /// and dropped.
    pub fn handle_frame(&mut self, raw: Bytes) -> Option<Packet> {
        let packet = match Frame::from_bytes(raw) {
            Frame::Valid(packet) => packet,
            Frame::Invalid { raw, reason } => {
                warn!(len = raw.len(), frame = %hex::encode(&raw), "Dropping invalid frame: {reason}");
                return None;
            }
        };

        let local_address = match self.repository.load() {
            Ok(config) => config.local_address,
            Err(e) => {
                error!("Cannot load configuration: {e}");
                return None;
            }
        };
        let receiver = packet.routing().receiver;
        if receiver != local_address && !receiver.is_broadcast() {
            debug!(%receiver, local = %local_address, "Frame addressed to another node");
            return None;
        }
        if let Payload::Error(report) = packet.payload() {
            warn!(sender = %packet.routing().sender, code = %report.code, "Error report received");
            return None;
        }

        let (processor, mut ctx) = self.parts(local_address);
        Some(processor.process(&packet, &mut ctx))
    }

    /// Answer every frame waiting on `port`, on the same port. Returns the number of replies sent.
    ///
    /// A failed send loses that reply only; the remaining frames are still answered.
    pub fn drain_port(&mut self, port: &mut dyn Port) -> usize {
        let port_type = port.port_type();
        let mut sent = 0;
        for raw in port.read() {
            let Some(reply) = self.handle_frame(raw) else {
                continue;
            };
            if reply.len() > port_type.max_frame_len() {
                warn!(
                    %port_type,
                    len = reply.len(),
                    max = port_type.max_frame_len(),
                    "Reply too large for port, dropping"
                );
                continue;
            }
            if let Err(e) = port.send(&reply.to_bytes()) {
                error!(%port_type, op_code = %reply.op_code(), "Failed to send reply: {e}");
                continue;
            }
            sent += 1;
        }
        sent
    }

    /// One scheduler cycle at `minute` since boot.
    ///
    /// Moves along the operation-mode graph once the current mode has run for its duration and
    /// returns the Iridium report due for the current mode, if any.
    pub fn tick(&mut self, minute: u64) -> Option<Packet> {
        let config = match self.repository.load() {
            Ok(config) => config,
            Err(e) => {
                error!("Cannot load configuration: {e}");
                return None;
            }
        };
        self.advance_mode(&config);
        let report = self.scheduled_report(&config, minute);
        self.schedule.cycles = self.schedule.cycles.saturating_add(1);
        report
    }

    fn advance_mode(&mut self, config: &NodeConfiguration) {
        let graph = &config.operation_graph.graph;
        let Some(transition) = graph.get(&self.schedule.mode) else {
            // The graph was replaced and no longer knows the current mode
            if let Ok(mode) = first_mode(config) {
                warn!(from = self.schedule.mode, to = mode, "Current mode left the graph, restarting");
                self.schedule = Schedule {
                    mode,
                    cycles: 0,
                    ..self.schedule
                };
            }
            return;
        };
        if self.schedule.cycles >= u32::from(transition.duration) {
            info!(from = self.schedule.mode, to = transition.next_mode, "Operation mode transition");
            self.schedule.mode = transition.next_mode;
            self.schedule.cycles = 0;
        }
    }

    fn scheduled_report(&mut self, config: &NodeConfiguration, minute: u64) -> Option<Packet> {
        let entry = config.iridium.entries.get(&self.schedule.mode)?;
        if minute.saturating_sub(self.schedule.last_report_minute) < u64::from(entry.period) {
            return None;
        }
        self.schedule.last_report_minute = minute;

        let op_code = match entry.report_type {
            ReportType::Complete => OperationCode::CompleteStatusReport,
            ReportType::Basic | ReportType::Summary => OperationCode::BasicStatusReport,
        };
        let (processor, mut ctx) = self.parts(config.local_address);
        match processor.run(op_code, &mut ctx, None) {
            Ok(report) => {
                debug!(%op_code, minute, "Scheduled report");
                Some(report)
            }
            Err(e) => {
                warn!(%op_code, "Scheduled report failed: {e}");
                None
            }
        }
    }
}

fn first_mode(config: &NodeConfiguration) -> Result<u8> {
    config
        .operation_graph
        .graph
        .keys()
        .next()
        .copied()
        .ok_or_else(|| AcouseaError::Config("operation graph is empty".to_string()))
}
