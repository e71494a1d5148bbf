//! Oiler Hardware Abstraction Layer
//!
//! This crate defines the capabilities the oiler core consumes from its
//! environment. Chip-specific crates (`oiler-hal-rp2040`) implement them,
//! and the core's tests implement them with in-memory mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  oiler-core (Oiler, TargetMachine)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  oiler-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  oiler-hal-   │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`line::LineIo`] - Digital line read/write by line id
//! - [`edge::EdgeService`] - Edge-event registration
//! - [`tick::TickService`] - Periodic tick registration
//! - [`Platform`] - Everything above, implemented by a board

#![no_std]
#![deny(unsafe_code)]

pub mod edge;
pub mod line;
pub mod tick;

pub use edge::{EdgeService, LineMode, Polarity};
pub use line::{Level, LineId, LineIo};
pub use tick::TickService;

/// Errors reported by platform services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Line number does not exist on this board
    InvalidLine,
    /// Line is already claimed for another purpose
    LineInUse,
    /// No more edge watchers or tick slots available
    NoCapacity,
}

/// Every capability the oiler needs from a board
pub trait Platform: LineIo + EdgeService + TickService {}

// Blanket implementation for types that implement all three services
impl<T: LineIo + EdgeService + TickService> Platform for T {}
