//! Digital line abstractions
//!
//! Lines are addressed by number so that wiring can come from
//! configuration rather than from types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Board line (GPIO) number
pub type LineId = u8;

/// Logic level of a digital line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    /// Check if this is the high level
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    /// Get the opposite level
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// Level that means "asserted" for an active-high or active-low line
    pub fn active(active_high: bool) -> Self {
        if active_high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Digital line I/O by line number
///
/// Used for polling input levels and driving outputs (alert, relays,
/// stepper coils).
pub trait LineIo {
    /// Read the current level of a line
    fn read(&self, line: LineId) -> Level;

    /// Drive a line to the given level
    fn write(&mut self, line: LineId, level: Level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_level() {
        assert_eq!(Level::active(true), Level::High);
        assert_eq!(Level::active(false), Level::Low);
        assert_eq!(Level::active(false).inverted(), Level::High);
    }

    #[test]
    fn test_from_bool() {
        assert!(Level::from(true).is_high());
        assert!(!Level::from(false).is_high());
    }
}
