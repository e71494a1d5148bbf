//! The machine being oiled
//!
//! Tracks how long the machine has been active and how much work it has
//! done since it was last oiled. Both inputs are optional; with neither
//! configured the machine reports [`MachineState::NoFeatures`] and the
//! oiler can only run on elapsed time.

pub mod target;

pub use target::{Activity, MachineError, MachineFeatures, MachineState, TargetMachine};

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Target machine shared between edge callbacks and the tick
pub type SharedMachine = Mutex<CriticalSectionRawMutex, RefCell<TargetMachine>>;

impl TargetMachine {
    /// Wrap the machine for sharing with interrupt-context callbacks
    pub fn into_shared(self) -> SharedMachine {
        Mutex::new(RefCell::new(self))
    }
}
