//! Capability traits
//!
//! These traits define the interface between the scheduler and the
//! things it schedules.

pub mod motor;

pub use motor::{Direction, MotorControl, MotorState};
