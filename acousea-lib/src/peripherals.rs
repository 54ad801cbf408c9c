//! Capabilities the core reads device state through.

use crate::module::BatteryStatus;
use chrono::Utc;

pub trait BatteryController {
    /// State of charge, 0 to 100.
    fn percentage(&self) -> u8;

    fn status(&self) -> BatteryStatus;
}

/// A position fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GpsFix {
    pub latitude: f32,
    pub longitude: f32,
}

pub trait Gps {
    fn read(&self) -> GpsFix;

    /// Epoch seconds of the last fix.
    fn timestamp(&self) -> i64;
}

pub trait RealTimeClock {
    /// Seconds since the Unix epoch.
    fn epoch(&self) -> i64;

    /// Set the clock to `epoch`. Clocks the node does not own ignore it.
    fn sync(&mut self, _epoch: i64) {}
}

/// Battery reporting constant values.
#[derive(Debug, Clone, Copy)]
pub struct FixedBattery {
    pub percentage: u8,
    pub status: BatteryStatus,
}

impl FixedBattery {
    pub fn new(percentage: u8, status: BatteryStatus) -> Self {
        Self {
            percentage: percentage.min(100),
            status,
        }
    }
}

impl BatteryController for FixedBattery {
    fn percentage(&self) -> u8 {
        self.percentage
    }

    fn status(&self) -> BatteryStatus {
        self.status
    }
}

/// GPS reporting a constant fix.
#[derive(Debug, Clone, Copy)]
pub struct FixedGps {
    pub fix: GpsFix,
    pub timestamp: i64,
}

impl FixedGps {
    pub fn new(latitude: f32, longitude: f32) -> Self {
        Self {
            fix: GpsFix { latitude, longitude },
            timestamp: 0,
        }
    }
}

impl Gps for FixedGps {
    fn read(&self) -> GpsFix {
        self.fix
    }

    fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl RealTimeClock for FixedClock {
    fn epoch(&self) -> i64 {
        self.0
    }

    fn sync(&mut self, epoch: i64) {
        self.0 = epoch;
    }
}

/// Host wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl RealTimeClock for SystemClock {
    fn epoch(&self) -> i64 {
        Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_battery_clamps() {
        let battery = FixedBattery::new(150, BatteryStatus::Full);
        assert_eq!(battery.percentage(), 100);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01
        assert!(SystemClock.epoch() > 1_577_836_800);
    }
}
