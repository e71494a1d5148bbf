//! Configuration type definitions

use heapless::Vec;
use oiler_hal::{Level, LineId};

use crate::dispatch::DEFAULT_DEBOUNCE_MS;
use crate::oiler::OilerMode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum motors the oiler can drive
pub const MAX_MOTORS: usize = 2;

/// GPIO lines on the controller board (GP0..GP29)
pub const LINE_COUNT: LineId = 30;

/// Default seconds between oilings in elapsed-time mode
pub const DEFAULT_OIL_INTERVAL_S: u32 = 30;

/// Default seconds of machine activity before it needs oil
pub const DEFAULT_ACTIVE_TIME_TARGET_S: u32 = 30;

/// Default machine work units (e.g. spindle revolutions) before it needs oil
pub const DEFAULT_WORK_UNIT_TARGET: u32 = 3;

/// Motor hardware variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotorKind {
    /// Four-line unipolar stepper
    Stepped {
        /// Coil lines in energising order
        lines: [LineId; 4],
        /// Steps per second
        speed: u32,
    },
    /// DC pump behind a relay
    Relay {
        line: LineId,
        /// Relay energises on a high line
        active_high: bool,
    },
}

impl MotorKind {
    /// Output lines the motor drives
    pub fn lines(&self) -> impl Iterator<Item = LineId> + '_ {
        let (stepped, relay) = match self {
            MotorKind::Stepped { lines, .. } => (Some(lines.iter().copied()), None),
            MotorKind::Relay { line, .. } => (None, Some(*line)),
        };
        stepped.into_iter().flatten().chain(relay)
    }
}

/// One dispensing motor and the sensor that reports its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorConfig {
    pub kind: MotorKind,
    /// Line pulsed by the drip sensor once per delivered drop
    pub work_line: LineId,
    /// Drops per oiling cycle
    pub work_target: u32,
    /// Seconds a batch may take before it counts as late
    ///
    /// Falls back to the oil interval when unset.
    pub delivery_budget_s: Option<u32>,
}

/// Monitored machine inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    /// Line that is held at the active level while the machine runs
    pub activity_line: Option<LineId>,
    /// Activity line reads high while the machine runs
    pub active_high: bool,
    /// Line pulsed once per unit of work
    pub work_line: Option<LineId>,
    /// Work pulses are high-going
    pub work_active_high: bool,
    /// Seconds of activity after which the machine needs oil
    pub active_time_target_s: u32,
    /// Work units after which the machine needs oil
    pub work_unit_target: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            activity_line: None,
            active_high: true,
            work_line: None,
            work_active_high: false,
            active_time_target_s: DEFAULT_ACTIVE_TIME_TARGET_S,
            work_unit_target: DEFAULT_WORK_UNIT_TARGET,
        }
    }
}

impl MachineConfig {
    /// Level of the activity line while the machine runs
    pub fn active_level(&self) -> Level {
        Level::active(self.active_high)
    }

    /// Level the work line settles at after a work pulse edge
    pub fn work_level(&self) -> Level {
        Level::active(self.work_active_high)
    }
}

/// Alert output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlertConfig {
    /// Output line asserted high on a stalled cycle
    pub line: LineId,
    /// How many times over target a cycle may run before alerting (0 = never)
    pub multiple: u32,
}

/// Complete oiler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OilerConfig {
    /// Scheduling mode
    pub mode: OilerMode,
    /// Seconds (time modes) or work units (activity mode)
    pub target: u32,
    /// Minimum spacing between accepted edges on one line (ms)
    #[cfg_attr(feature = "serde", serde(default = "default_debounce_ms"))]
    pub debounce_ms: u32,
    pub alert: Option<AlertConfig>,
    pub machine: Option<MachineConfig>,
    pub motors: Vec<MotorConfig, MAX_MOTORS>,
}

#[cfg(feature = "serde")]
fn default_debounce_ms() -> u32 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for OilerConfig {
    fn default() -> Self {
        Self {
            mode: OilerMode::OnElapsedTime,
            target: DEFAULT_OIL_INTERVAL_S,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            alert: None,
            machine: None,
            motors: Vec::new(),
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    const MACHINE_TOML: &str = r#"
        mode = "OnTargetActivity"
        target = 3

        [alert]
        line = 19
        multiple = 2

        [machine]
        activity_line = 12
        active_high = true
        work_line = 13
        work_active_high = false
        active_time_target_s = 30
        work_unit_target = 3

        [[motors]]
        work_line = 17
        work_target = 3

        [motors.kind.Stepped]
        lines = [4, 5, 6, 7]
        speed = 800
    "#;

    #[test]
    fn test_parse_toml() {
        let config: OilerConfig = toml::from_str(MACHINE_TOML).unwrap();

        assert_eq!(config.mode, OilerMode::OnTargetActivity);
        assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert_eq!(config.alert, Some(AlertConfig { line: 19, multiple: 2 }));
        assert_eq!(config.motors.len(), 1);
        assert_eq!(
            config.motors[0].kind,
            MotorKind::Stepped {
                lines: [4, 5, 6, 7],
                speed: 800
            }
        );
        assert_eq!(config.motors[0].delivery_budget_s, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postcard_embedding() {
        let config: OilerConfig = toml::from_str(MACHINE_TOML).unwrap();
        let bytes = postcard::to_allocvec(&config).unwrap();
        let decoded: OilerConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, config);
    }
}

#[cfg(test)]
mod kind_tests {
    use super::*;

    #[test]
    fn test_motor_lines() {
        let stepped = MotorKind::Stepped {
            lines: [4, 5, 6, 7],
            speed: 800,
        };
        let lines: Vec<LineId, 4> = stepped.lines().collect();
        assert_eq!(&lines[..], &[4, 5, 6, 7]);

        let relay = MotorKind::Relay {
            line: 9,
            active_high: true,
        };
        let lines: Vec<LineId, 4> = relay.lines().collect();
        assert_eq!(&lines[..], &[9]);
    }
}
