//! Relay-switched pump motor

use oiler_hal::{Level, LineId, LineIo};

use super::Lifecycle;
use crate::traits::{Direction, MotorControl, MotorState};

/// DC pump switched by a single relay line
///
/// Direction is recorded but has no effect: a single relay cannot reverse
/// the pump.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RelayMotor {
    line: LineId,
    /// Relay energises on a high line (false for active-low boards)
    active_high: bool,
    lifecycle: Lifecycle,
}

impl RelayMotor {
    pub fn new(line: LineId, active_high: bool) -> Self {
        Self {
            line,
            active_high,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Drive the relay to its released level
    pub fn release<IO: LineIo + ?Sized>(&self, io: &mut IO) {
        io.write(self.line, self.energised().inverted());
    }

    fn energised(&self) -> Level {
        Level::active(self.active_high)
    }
}

impl MotorControl for RelayMotor {
    fn on<IO: LineIo + ?Sized>(&mut self, now_ms: u32, io: &mut IO) {
        self.lifecycle.start(now_ms);
        io.write(self.line, self.energised());
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
    fn test_active_high_relay() {
        let mut io = MockPlatform::new();
        let mut motor = RelayMotor::new(4, true);

        motor.release(&mut io);
        assert_eq!(io.level(4), Level::Low);

        motor.on(0, &mut io);
        assert_eq!(io.level(4), Level::High);

        motor.off(100, &mut io);
        assert_eq!(io.level(4), Level::Low);
    }

    #[test]
    fn test_active_low_relay() {
        let mut io = MockPlatform::new();
        let mut motor = RelayMotor::new(4, false);

        motor.release(&mut io);
        assert_eq!(io.level(4), Level::High);

        motor.on(0, &mut io);
        assert_eq!(io.level(4), Level::Low);

        motor.off(100, &mut io);
        assert_eq!(io.level(4), Level::High);
    }
}
