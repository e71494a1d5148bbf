//! Edge-event registration
//!
//! The platform watches a line and delivers a callback whenever it changes
//! in the requested direction. How the callback reaches the core is up to
//! the platform (interrupt handler, async watcher task, test harness).

use crate::line::{Level, LineId};
use crate::HalError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which transitions of a line produce events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Polarity {
    /// Low to high
    Rising,
    /// High to low
    Falling,
    /// Any change
    Either,
}

impl Polarity {
    /// Polarity whose edges end at the given level
    pub fn towards(level: Level) -> Self {
        match level {
            Level::High => Polarity::Rising,
            Level::Low => Polarity::Falling,
        }
    }

    /// Check if a line that just changed to `level` matches this polarity
    pub fn matches(self, level: Level) -> bool {
        match self {
            Polarity::Rising => level == Level::High,
            Polarity::Falling => level == Level::Low,
            Polarity::Either => true,
        }
    }
}

/// Electrical configuration of a watched input line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LineMode {
    /// Floating input
    Input,
    /// Input with internal pull-up
    #[default]
    PullUp,
    /// Input with internal pull-down
    PullDown,
}

/// Edge-event source
pub trait EdgeService {
    /// Start delivering edge events for `line`
    fn register_edge(
        &mut self,
        line: LineId,
        polarity: Polarity,
        mode: LineMode,
    ) -> Result<(), HalError>;
}
