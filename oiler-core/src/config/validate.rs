//! Configuration validation
//!
//! Catches wiring and target mistakes before anything is registered, so a
//! bad `machine.toml` fails the firmware build instead of misbehaving on
//! the bench.

use heapless::Vec;
use oiler_hal::LineId;

use super::types::{OilerConfig, LINE_COUNT, MAX_MOTORS};
use crate::oiler::OilerMode;

/// Upper bound on distinct lines a config can name
const MAX_CONFIG_LINES: usize = MAX_MOTORS * 5 + 3;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No motors configured
    NoMotors,
    /// A motor's drops-per-cycle is zero
    ZeroWorkTarget,
    /// Mode target (interval, active time, work units) is zero
    ZeroTarget,
    /// The same line is assigned twice
    DuplicateLine(LineId),
    /// Line number is not on the board
    LineOutOfRange(LineId),
    /// Mode needs a machine input that is not configured
    MissingMachineFeature,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::NoMotors => write!(f, "at least one motor must be configured"),
            ConfigError::ZeroWorkTarget => write!(f, "motor work_target must be at least 1"),
            ConfigError::ZeroTarget => write!(f, "mode target must be at least 1"),
            ConfigError::DuplicateLine(line) => write!(f, "line {} is assigned twice", line),
            ConfigError::LineOutOfRange(line) => {
                write!(f, "line {} is out of range (0..{})", line, LINE_COUNT)
            }
            ConfigError::MissingMachineFeature => {
                write!(f, "mode requires a machine line that is not configured")
            }
        }
    }
}

impl OilerConfig {
    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.motors.is_empty() {
            return Err(ConfigError::NoMotors);
        }
        if self.target == 0 {
            return Err(ConfigError::ZeroTarget);
        }
        if self.motors.iter().any(|m| m.work_target == 0) {
            return Err(ConfigError::ZeroWorkTarget);
        }

        let machine = self.machine.as_ref();
        match self.mode {
            OilerMode::OnElapsedTime => {}
            OilerMode::OnPoweredTime => {
                if machine.and_then(|m| m.activity_line).is_none() {
                    return Err(ConfigError::MissingMachineFeature);
                }
            }
            OilerMode::OnTargetActivity => {
                if machine.and_then(|m| m.work_line).is_none() {
                    return Err(ConfigError::MissingMachineFeature);
                }
            }
        }

        let mut seen: Vec<LineId, MAX_CONFIG_LINES> = Vec::new();
        let motor_lines = self
            .motors
            .iter()
            .flat_map(|m| m.kind.lines().chain(core::iter::once(m.work_line)));
        let machine_lines = machine
            .into_iter()
            .flat_map(|m| m.activity_line.into_iter().chain(m.work_line));
        let alert_line = self.alert.map(|a| a.line);

        for line in motor_lines.chain(machine_lines).chain(alert_line) {
            if line >= LINE_COUNT {
                return Err(ConfigError::LineOutOfRange(line));
            }
            if seen.contains(&line) {
                return Err(ConfigError::DuplicateLine(line));
            }
            // Capacity covers every line a config can name
            let _ = seen.push(line);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlertConfig, MachineConfig, MotorConfig, MotorKind};

    fn relay_motor(line: LineId, work_line: LineId) -> MotorConfig {
        MotorConfig {
            kind: MotorKind::Relay {
                line,
                active_high: true,
            },
            work_line,
            work_target: 3,
            delivery_budget_s: None,
        }
    }

    fn base_config() -> OilerConfig {
        let mut config = OilerConfig::default();
        config.motors.push(relay_motor(4, 17)).unwrap();
        config
    }

    #[test]
    fn test_valid_elapsed_config() {
        assert_eq!(base_config().validate(), Ok(()));
    }

    #[test]
    fn test_no_motors() {
        let config = OilerConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::NoMotors));
    }

    #[test]
    fn test_zero_targets() {
        let mut config = base_config();
        config.target = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTarget));

        let mut config = base_config();
        config.motors[0].work_target = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroWorkTarget));
    }

    #[test]
    fn test_duplicate_lines() {
        let mut config = base_config();
        config.alert = Some(AlertConfig {
            line: 17,
            multiple: 2,
        });
        assert_eq!(config.validate(), Err(ConfigError::DuplicateLine(17)));

        let mut config = base_config();
        config.motors.push(relay_motor(4, 3)).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::DuplicateLine(4)));
    }

    #[test]
    fn test_line_out_of_range() {
        let mut config = base_config();
        config.alert = Some(AlertConfig {
            line: LINE_COUNT,
            multiple: 2,
        });
        assert_eq!(
            config.validate(),
            Err(ConfigError::LineOutOfRange(LINE_COUNT))
        );

        config.alert = Some(AlertConfig {
            line: LINE_COUNT - 1,
            multiple: 2,
        });
        assert_eq!(config.validate(), Ok(()));

        let mut config = base_config();
        config.motors.push(relay_motor(40, 18)).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::LineOutOfRange(40)));
    }

    #[test]
    fn test_mode_needs_machine_feature() {
        let mut config = base_config();
        config.mode = OilerMode::OnTargetActivity;
        assert_eq!(config.validate(), Err(ConfigError::MissingMachineFeature));

        config.machine = Some(MachineConfig {
            activity_line: Some(12),
            ..Default::default()
        });
        assert_eq!(config.validate(), Err(ConfigError::MissingMachineFeature));

        config.mode = OilerMode::OnPoweredTime;
        assert_eq!(config.validate(), Ok(()));
    }
}
