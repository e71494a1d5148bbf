//! Board-agnostic core logic for the oiler firmware
//!
//! This crate contains all scheduling logic that does not depend on
//! specific hardware implementations:
//!
//! - Motor lifecycle (stepped and relay-driven dispensing motors)
//! - Target machine activity and work accounting
//! - Debounced routing of line-change events
//! - The oiler scheduler and its fault alert
//! - Configuration type definitions
//!
//! Everything that changes in response to both edge callbacks and the
//! periodic tick lives behind a critical-section mutex
//! ([`oiler::SharedOiler`], [`machine::SharedMachine`]).

#![no_std]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod config;
pub mod dispatch;
pub mod machine;
pub mod motor;
pub mod oiler;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;
