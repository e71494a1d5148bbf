//! RP2040-specific HAL for the oiler firmware
//!
//! This crate implements the `oiler-hal` capabilities on an RP2040:
//!
//! - Pin allocation by number for config-driven setup
//! - Line I/O over embassy-rp GPIO
//! - Edge watchers, drained by the firmware into async tasks
//! - Tick registration, forwarded to the firmware's tick task

#![no_std]

pub mod board;
pub mod pins;

pub use board::{EdgeWatcher, Rp2040Board, MAX_WATCHERS, TICK_REQUEST};
pub use pins::{PinBank, PinError};
