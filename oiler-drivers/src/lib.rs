//! Hardware driver implementations
//!
//! Drivers that turn the scheduler's motor intent into line levels:
//!
//! - Stepper coil sequencing for four-line unipolar steppers

#![no_std]
#![deny(unsafe_code)]

pub mod stepper;
