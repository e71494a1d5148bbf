//! Motor pool slots

use oiler_hal::{LineId, LineIo};

use crate::config::MotorConfig;
use crate::motor::Motor;
use crate::traits::MotorControl;

/// One dispensing motor and its drip counter
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorSlot {
    pub motor: Motor,
    pub work_line: LineId,
    /// Drops counted since the motor last started
    pub work_count: u32,
    /// Drops per cycle
    pub work_target: u32,
    /// Delivery budget override (ms)
    pub alert_threshold: Option<u32>,
}

impl MotorSlot {
    pub fn new(config: &MotorConfig) -> Self {
        Self {
            motor: Motor::from_kind(&config.kind),
            work_line: config.work_line,
            work_count: 0,
            work_target: config.work_target,
            alert_threshold: config.delivery_budget_s.map(|s| s.saturating_mul(1000)),
        }
    }

    /// Start the motor and zero its counter
    pub fn start<IO: LineIo + ?Sized>(&mut self, now_ms: u32, io: &mut IO) {
        self.motor.on(now_ms, io);
        self.work_count = 0;
    }

    /// Milliseconds a running batch may take before it counts as late
    pub fn budget_ms(&self, interval_ms: u32) -> u32 {
        self.alert_threshold.unwrap_or(interval_ms)
    }

    /// Count one drop; returns true if the motor just reached its target
    pub fn count_work(&mut self) -> bool {
        self.work_count = self.work_count.saturating_add(1);
        self.motor.is_running() && self.work_count >= self.work_target
    }
}
