//! Stalled-cycle alert output
//!
//! The alert is observational: it drives one output line and never feeds
//! back into scheduling.

use oiler_hal::{Level, LineId, LineIo};

/// Alert output and its trip multiple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alert {
    line: LineId,
    /// 0 disables the alert
    multiple: u32,
    asserted: bool,
}

impl Alert {
    pub const fn new(line: LineId, multiple: u32) -> Self {
        Self {
            line,
            multiple,
            asserted: false,
        }
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    pub fn multiple(&self) -> u32 {
        self.multiple
    }

    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// Check if `actual` has overrun `target` by the trip multiple
    pub fn trips(&self, actual: u32, target: u32) -> bool {
        self.multiple > 0 && u64::from(actual) >= u64::from(target) * u64::from(self.multiple)
    }

    /// Assert the output if `actual` trips; leave it alone otherwise
    pub fn check<IO: LineIo + ?Sized>(&mut self, actual: u32, target: u32, io: &mut IO) {
        if self.trips(actual, target) {
            if !self.asserted {
                warn!(
                    "Alert on line {}: {} >= {} x {}",
                    self.line,
                    actual,
                    target,
                    self.multiple
                );
            }
            io.write(self.line, Level::High);
            self.asserted = true;
        }
    }

    /// Deassert the output
    pub fn clear<IO: LineIo + ?Sized>(&mut self, io: &mut IO) {
        if self.asserted {
            info!("Alert on line {} cleared", self.line);
        }
        io.write(self.line, Level::Low);
        self.asserted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPlatform;
    use proptest::prelude::*;

    #[test]
    fn test_assert_and_clear() {
        let mut io = MockPlatform::new();
        let mut alert = Alert::new(19, 2);

        alert.check(5, 3, &mut io);
        assert!(!alert.is_asserted());
        assert_eq!(io.level(19), Level::Low);

        alert.check(6, 3, &mut io);
        assert!(alert.is_asserted());
        assert_eq!(io.level(19), Level::High);

        // Dropping below the threshold does not deassert
        alert.check(1, 3, &mut io);
        assert!(alert.is_asserted());

        alert.clear(&mut io);
        assert!(!alert.is_asserted());
        assert_eq!(io.level(19), Level::Low);
    }

    #[test]
    fn test_disabled() {
        let mut io = MockPlatform::new();
        let mut alert = Alert::new(19, 0);
        alert.check(u32::MAX, 0, &mut io);
        assert!(!alert.is_asserted());
        assert_eq!(io.level(19), Level::Low);
    }

    #[test]
    fn test_no_overflow() {
        let alert = Alert::new(19, 3);
        assert!(!alert.trips(u32::MAX, u32::MAX));
    }

    proptest! {
        #[test]
        fn prop_trips_iff_over_multiple(
            actual in any::<u32>(),
            target in any::<u32>(),
            multiple in 0u32..16,
        ) {
            let alert = Alert::new(19, multiple);
            let expected = multiple > 0
                && u128::from(actual) >= u128::from(target) * u128::from(multiple);
            prop_assert_eq!(alert.trips(actual, target), expected);
        }
    }
}
