//! Stepper driver implementations

pub mod four_pin;

pub use four_pin::{FourPinSequencer, FULL_STEP};
