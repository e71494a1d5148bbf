//! Dispensing motors
//!
//! A closed set of motor variants stored by value in the oiler's slots:
//!
//! - [`SteppedMotor`]: four coil lines, configurable speed
//! - [`RelayMotor`]: a DC pump switched by one relay line
//!
//! Both share a [`Lifecycle`] that records run state, direction and the
//! timestamps of the last start and stop.

pub mod relay;
pub mod stepped;

pub use relay::RelayMotor;
pub use stepped::SteppedMotor;

use oiler_hal::LineIo;

use crate::config::MotorKind;
use crate::traits::{Direction, MotorControl, MotorState};

/// Run state and timing shared by every motor variant
///
/// Timestamps are monotonic milliseconds and all arithmetic on them wraps,
/// so a `u32` clock rolling over after ~49 days is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lifecycle {
    state: MotorState,
    direction: Direction,
    time_started: u32,
    time_stopped: u32,
}

impl Lifecycle {
    /// Create a stopped, forward-facing lifecycle
    pub const fn new() -> Self {
        Self {
            state: MotorState::Stopped,
            direction: Direction::Forward,
            time_started: 0,
            time_stopped: 0,
        }
    }

    /// Mark running from `now_ms`
    pub fn start(&mut self, now_ms: u32) {
        self.time_started = now_ms;
        self.state = MotorState::Running;
    }

    /// Mark stopped at `now_ms`
    pub fn stop(&mut self, now_ms: u32) {
        self.time_stopped = now_ms;
        self.state = MotorState::Stopped;
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, dir: Direction) {
        self.direction = dir;
    }

    /// Time the motor was last started
    pub fn time_started(&self) -> u32 {
        self.time_started
    }

    /// Time the motor was last stopped
    pub fn time_stopped(&self) -> u32 {
        self.time_stopped
    }

    /// Milliseconds since the motor started, or 0 when stopped
    pub fn time_running(&self, now_ms: u32) -> u32 {
        match self.state {
            MotorState::Running => now_ms.wrapping_sub(self.time_started),
            MotorState::Stopped => 0,
        }
    }

    /// Milliseconds since the motor stopped, or 0 while running
    pub fn time_since_stopped(&self, now_ms: u32) -> u32 {
        match self.state {
            MotorState::Stopped => now_ms.wrapping_sub(self.time_stopped),
            MotorState::Running => 0,
        }
    }
}

/// A dispensing motor of either supported kind
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Motor {
    Stepped(SteppedMotor),
    Relay(RelayMotor),
}

impl Motor {
    /// Build the motor variant described by a configuration entry
    pub fn from_kind(kind: &MotorKind) -> Self {
        match *kind {
            MotorKind::Stepped { lines, speed } => Motor::Stepped(SteppedMotor::new(lines, speed)),
            MotorKind::Relay { line, active_high } => {
                Motor::Relay(RelayMotor::new(line, active_high))
            }
        }
    }

    fn lifecycle(&self) -> &Lifecycle {
        match self {
            Motor::Stepped(m) => m.lifecycle(),
            Motor::Relay(m) => m.lifecycle(),
        }
    }

    /// Drive the motor's output lines to their idle levels
    ///
    /// Leaves the lifecycle untouched; used when a motor is first registered.
    pub fn release<IO: LineIo + ?Sized>(&self, io: &mut IO) {
        match self {
            Motor::Stepped(m) => m.release(io),
            Motor::Relay(m) => m.release(io),
        }
    }

    pub fn time_started(&self) -> u32 {
        self.lifecycle().time_started()
    }

    pub fn time_stopped(&self) -> u32 {
        self.lifecycle().time_stopped()
    }

    /// Milliseconds since the motor started, or 0 when stopped
    pub fn time_running(&self, now_ms: u32) -> u32 {
        self.lifecycle().time_running(now_ms)
    }

    /// Milliseconds since the motor stopped, or 0 while running
    pub fn time_since_stopped(&self, now_ms: u32) -> u32 {
        self.lifecycle().time_since_stopped(now_ms)
    }
}

impl MotorControl for Motor {
    fn on<IO: LineIo + ?Sized>(&mut self, now_ms: u32, io: &mut IO) {
        match self {
            Motor::Stepped(m) => m.on(now_ms, io),
            Motor::Relay(m) => m.on(now_ms, io),
        }
    }

    fn off<IO: LineIo + ?Sized>(&mut self, now_ms: u32, io: &mut IO) {
        match self {
            Motor::Stepped(m) => m.off(now_ms, io),
            Motor::Relay(m) => m.off(now_ms, io),
        }
    }

    fn set_direction(&mut self, dir: Direction) {
        match self {
            Motor::Stepped(m) => m.set_direction(dir),
            Motor::Relay(m) => m.set_direction(dir),
        }
    }

    fn direction(&self) -> Direction {
        self.lifecycle().direction()
    }

    fn state(&self) -> MotorState {
        self.lifecycle().state()
    }
}
