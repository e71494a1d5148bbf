//! Four-line unipolar stepper sequencer
//!
//! Drives the coils of a small unipolar stepper (28BYJ-48 behind a
//! ULN2003 and similar) in full-step, two-coils-on mode.
//!
//! # Usage
//!
//! The sequencer is updated by calling `update_with_delta()` periodically.
//! It returns the coil pattern to apply whenever the pattern changes.
//!
//! ```ignore
//! let mut seq = FourPinSequencer::new(800);
//!
//! // In the periodic stepper task:
//! seq.follow(&stepped_motor);
//! if let Some(pattern) = seq.update_with_delta(1) {
//!     FourPinSequencer::write_coils(stepped_motor.lines(), pattern, &mut io);
//! }
//! ```

use oiler_core::motor::SteppedMotor;
use oiler_core::traits::{Direction, MotorControl};
use oiler_hal::{Level, LineId, LineIo};

const H: Level = Level::High;
const L: Level = Level::Low;

/// Full-step coil patterns, forward order
pub const FULL_STEP: [[Level; 4]; 4] = [
    [H, H, L, L],
    [L, H, H, L],
    [L, L, H, H],
    [H, L, L, H],
];

/// All coils off
const RELEASED: [Level; 4] = [L; 4];

/// Coil sequencer state
#[derive(Debug, Clone)]
pub struct FourPinSequencer {
    /// Steps per second
    speed: u32,
    direction: Direction,
    running: bool,
    /// Index into [`FULL_STEP`]
    phase: usize,
    /// Time accumulated towards the next step (us)
    accumulated_us: u32,
    /// Coils still energised after a stop
    needs_release: bool,
}

impl FourPinSequencer {
    /// Create a stopped sequencer
    pub fn new(speed: u32) -> Self {
        Self {
            speed,
            direction: Direction::Forward,
            running: false,
            phase: 0,
            accumulated_us: 0,
            needs_release: false,
        }
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, dir: Direction) {
        self.direction = dir;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current coil pattern
    pub fn pattern(&self) -> [Level; 4] {
        if self.running {
            FULL_STEP[self.phase]
        } else {
            RELEASED
        }
    }

    /// Start stepping from the current phase
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.accumulated_us = 0;
        }
    }

    /// Stop stepping; the coils are released on the next update
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.needs_release = true;
        }
    }

    /// Mirror the run state, direction and speed of a scheduled motor
    pub fn follow(&mut self, motor: &SteppedMotor) {
        self.speed = motor.speed();
        self.direction = motor.direction();
        if motor.is_running() {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Advance by `delta_ms`
    ///
    /// Returns the new coil pattern if it changed.
    pub fn update_with_delta(&mut self, delta_ms: u32) -> Option<[Level; 4]> {
        if !self.running {
            if self.needs_release {
                self.needs_release = false;
                return Some(RELEASED);
            }
            return None;
        }

        if self.speed == 0 {
            return None;
        }

        let step_us = (1_000_000 / self.speed).max(1);
        self.accumulated_us = self
            .accumulated_us
            .saturating_add(delta_ms.saturating_mul(1000));
        let steps = self.accumulated_us / step_us;
        if steps == 0 {
            return None;
        }
        self.accumulated_us %= step_us;

        let steps = (steps % 4) as usize;
        self.phase = match self.direction {
            Direction::Forward => (self.phase + steps) % 4,
            Direction::Backward => (self.phase + 4 - steps) % 4,
        };
        Some(FULL_STEP[self.phase])
    }

    /// Apply a coil pattern to the motor's lines
    pub fn write_coils<IO: LineIo + ?Sized>(lines: [LineId; 4], pattern: [Level; 4], io: &mut IO) {
        for (line, level) in lines.into_iter().zip(pattern) {
            io.write(line, level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let mut seq = FourPinSequencer::new(500);
        assert!(!seq.is_running());
        assert_eq!(seq.pattern(), RELEASED);
        assert_eq!(seq.update_with_delta(10), None);
    }

    #[test]
    fn test_steps_at_speed() {
        // 500 steps/s = one step every 2 ms
        let mut seq = FourPinSequencer::new(500);
        seq.start();

        assert_eq!(seq.update_with_delta(1), None);
        assert_eq!(seq.update_with_delta(1), Some(FULL_STEP[1]));
        assert_eq!(seq.update_with_delta(2), Some(FULL_STEP[2]));
        assert_eq!(seq.update_with_delta(2), Some(FULL_STEP[3]));
        assert_eq!(seq.update_with_delta(2), Some(FULL_STEP[0]));
    }

    #[test]
    fn test_multiple_steps_per_update() {
        let mut seq = FourPinSequencer::new(1000);
        seq.start();
        // 3 steps in one 3 ms update
        assert_eq!(seq.update_with_delta(3), Some(FULL_STEP[3]));
    }

    #[test]
    fn test_backward() {
        let mut seq = FourPinSequencer::new(1000);
        seq.set_direction(Direction::Backward);
        seq.start();
        assert_eq!(seq.update_with_delta(1), Some(FULL_STEP[3]));
        assert_eq!(seq.update_with_delta(1), Some(FULL_STEP[2]));
    }

    #[test]
    fn test_release_once_after_stop() {
        let mut seq = FourPinSequencer::new(1000);
        seq.start();
        seq.update_with_delta(1);
        seq.stop();

        assert_eq!(seq.update_with_delta(1), Some(RELEASED));
        assert_eq!(seq.update_with_delta(1), None);
    }

    #[test]
    fn test_zero_speed_holds() {
        let mut seq = FourPinSequencer::new(0);
        seq.start();
        assert_eq!(seq.update_with_delta(100), None);
        assert_eq!(seq.pattern(), FULL_STEP[0]);
    }

    #[test]
    fn test_adjacent_patterns_share_a_coil() {
        for i in 0..4 {
            let a = FULL_STEP[i];
            let b = FULL_STEP[(i + 1) % 4];
            let shared = a.iter().zip(b.iter()).filter(|(x, y)| x.is_high() && y.is_high());
            assert_eq!(shared.count(), 1);
        }
    }

    #[test]
    fn test_follow_motor() {
        struct Coils([Level; 8]);
        impl LineIo for Coils {
            fn read(&self, line: LineId) -> Level {
                self.0[line as usize]
            }
            fn write(&mut self, line: LineId, level: Level) {
                self.0[line as usize] = level;
            }
        }

        let mut io = Coils([Level::Low; 8]);
        let mut motor = SteppedMotor::new([4, 5, 6, 7], 1000);
        let mut seq = FourPinSequencer::new(0);

        motor.set_direction(Direction::Backward);
        motor.on(0, &mut io);
        seq.follow(&motor);
        assert!(seq.is_running());
        assert_eq!(seq.speed(), 1000);
        assert_eq!(seq.direction(), Direction::Backward);

        let pattern = seq.update_with_delta(1).unwrap();
        FourPinSequencer::write_coils(motor.lines(), pattern, &mut io);
        assert_eq!(&io.0[4..], &FULL_STEP[3]);

        motor.off(5, &mut io);
        seq.follow(&motor);
        assert_eq!(seq.update_with_delta(1), Some(RELEASED));
    }
}
