//! Dispensing motor capability
//!
//! Both motor variants (four-line stepper, single relay) expose the same
//! small capability set. The scheduler only ever switches motors on and
//! off and records the intended direction; pulse generation belongs to a
//! driver outside the core.

use oiler_hal::LineIo;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motor rotation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Normal pumping direction
    #[default]
    Forward,
    /// Reverse (priming, clearing a blockage)
    Backward,
}

/// Motor run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotorState {
    #[default]
    Stopped,
    Running,
}

/// Capability set shared by all dispensing motors
pub trait MotorControl {
    /// Start the motor, recording `now_ms` as the start time
    fn on<IO: LineIo + ?Sized>(&mut self, now_ms: u32, io: &mut IO);

    /// Stop the motor, recording `now_ms` as the stop time
    fn off<IO: LineIo + ?Sized>(&mut self, now_ms: u32, io: &mut IO);

    /// Store the requested direction
    ///
    /// This is intent only; the motor driver applies it.
    fn set_direction(&mut self, dir: Direction);

    /// Get the requested direction
    fn direction(&self) -> Direction;

    /// Get the current run state
    fn state(&self) -> MotorState;

    /// Check if the motor is running
    fn is_running(&self) -> bool {
        self.state() == MotorState::Running
    }
}
