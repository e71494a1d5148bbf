//! Four-line stepper motor
//!
//! The core only tracks whether the stepper should be turning, in which
//! direction and how fast. Coil sequencing is done by a driver that reads
//! this state (see `oiler-drivers`). Stopping releases all four coils so
//! an idle pump does not sit energised.

use oiler_hal::{Level, LineId, LineIo};

use super::Lifecycle;
use crate::traits::{Direction, MotorControl, MotorState};

/// Stepper motor on four coil lines
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SteppedMotor {
    /// Coil lines in energising order
    lines: [LineId; 4],
    /// Speed in steps per second
    speed: u32,
    lifecycle: Lifecycle,
}

impl SteppedMotor {
    /// Create a stopped stepper on the given coil lines
    pub fn new(lines: [LineId; 4], speed: u32) -> Self {
        Self {
            lines,
            speed,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn lines(&self) -> [LineId; 4] {
        self.lines
    }

    /// Speed in steps per second
    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// De-energise all coils
    pub fn release<IO: LineIo + ?Sized>(&self, io: &mut IO) {
        for line in self.lines {
            io.write(line, Level::Low);
        }
    }
}

impl MotorControl for SteppedMotor {
    fn on<IO: LineIo + ?Sized>(&mut self, now_ms: u32, _io: &mut IO) {
        self.lifecycle.start(now_ms);
    }

    fn off<IO: LineIo + ?Sized>(&mut self, now_ms: u32, io: &mut IO) {
        self.lifecycle.stop(now_ms);
        self.release(io);
    }

    fn set_direction(&mut self, dir: Direction) {
        self.lifecycle.set_direction(dir);
    }

    fn direction(&self) -> Direction {
        self.lifecycle.direction()
    }

    fn state(&self) -> MotorState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPlatform;

    #[test]
    fn test_off_releases_coils() {
        let mut io = MockPlatform::new();
        for line in [4, 5, 6, 7] {
            io.write(line, Level::High);
        }

        let mut motor = SteppedMotor::new([4, 5, 6, 7], 800);
        motor.on(10, &mut io);
        assert!(io.level(4).is_high());

        motor.off(20, &mut io);
        for line in [4, 5, 6, 7] {
            assert_eq!(io.level(line), Level::Low);
        }
    }

    #[test]
    fn test_speed() {
        let motor = SteppedMotor::new([0, 1, 2, 3], 800);
        assert_eq!(motor.speed(), 800);
    }
}
