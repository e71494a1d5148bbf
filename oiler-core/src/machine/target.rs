//! Target machine activity and work accounting
//!
//! Active time is accumulated lazily: the activity edge callback opens an
//! interval when the machine goes active and closes it when it goes idle.
//! Queries made while the machine is still active fold the open interval
//! in as of the query time, so readiness is never staler than one query.

use oiler_hal::{Level, LineId};

use crate::config::{MachineConfig, DEFAULT_ACTIVE_TIME_TARGET_S, DEFAULT_WORK_UNIT_TARGET};

/// Whether the machine needs oil
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MachineState {
    /// A target was reached since monitoring last restarted
    Ready,
    /// Still accumulating
    NotReady,
    /// Neither activity nor work line configured; readiness is unknowable
    NoFeatures,
}

/// Current activity of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    Active,
    #[default]
    Idle,
}

/// Machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MachineError {
    /// The line backing this target was never configured
    FeatureNotConfigured,
    /// Targets must be at least 1
    InvalidTarget,
}

/// Which machine inputs are wired, and how
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MachineFeatures {
    pub activity_line: Option<LineId>,
    /// Activity line level while the machine runs
    pub active_level: Level,
    pub work_line: Option<LineId>,
    /// Work line level after a work pulse edge
    pub work_level: Level,
}

impl MachineFeatures {
    /// No inputs wired
    pub const fn none() -> Self {
        Self {
            activity_line: None,
            active_level: Level::High,
            work_line: None,
            work_level: Level::Low,
        }
    }

    /// Check if any input is wired
    pub fn any(&self) -> bool {
        self.activity_line.is_some() || self.work_line.is_some()
    }
}

impl From<&MachineConfig> for MachineFeatures {
    fn from(config: &MachineConfig) -> Self {
        Self {
            activity_line: config.activity_line,
            active_level: config.active_level(),
            work_line: config.work_line,
            work_level: config.work_level(),
        }
    }
}

/// The machine being oiled
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TargetMachine {
    features: MachineFeatures,
    state: MachineState,
    activity: Activity,
    /// Active time accumulated since monitoring restarted (ms)
    active_time_ms: u32,
    /// When the current active interval began
    active_time_started: u32,
    /// Work units since monitoring restarted
    work_units: u32,
    active_time_target_s: u32,
    work_unit_target: u32,
}

impl TargetMachine {
    /// Create a machine with default targets
    ///
    /// The machine starts idle; the first activity edge or poll brings it
    /// up to date.
    pub fn new(features: MachineFeatures) -> Self {
        Self {
            features,
            state: if features.any() {
                MachineState::NotReady
            } else {
                MachineState::NoFeatures
            },
            activity: Activity::Idle,
            active_time_ms: 0,
            active_time_started: 0,
            work_units: 0,
            active_time_target_s: DEFAULT_ACTIVE_TIME_TARGET_S,
            work_unit_target: DEFAULT_WORK_UNIT_TARGET,
        }
    }

    /// Create a machine from its configuration
    pub fn from_config(config: &MachineConfig) -> Result<Self, MachineError> {
        let mut machine = Self::new(MachineFeatures::from(config));
        if config.activity_line.is_some() {
            machine.set_active_time_target(config.active_time_target_s)?;
        }
        if config.work_line.is_some() {
            machine.set_work_target(config.work_unit_target)?;
        }
        Ok(machine)
    }

    pub fn features(&self) -> &MachineFeatures {
        &self.features
    }

    /// Current state without re-syncing active time
    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Whole seconds of active time accumulated so far
    pub fn active_time_s(&self) -> u32 {
        self.active_time_ms / 1000
    }

    /// Work units counted since monitoring restarted
    pub fn work_units(&self) -> u32 {
        self.work_units
    }

    pub fn active_time_target_s(&self) -> u32 {
        self.active_time_target_s
    }

    pub fn work_unit_target(&self) -> u32 {
        self.work_unit_target
    }

    /// Reset counters and start a new monitoring period
    ///
    /// If the machine is active right now its active interval restarts at
    /// `now_ms`.
    pub fn restart_monitoring(&mut self, now_ms: u32) {
        self.active_time_ms = 0;
        self.work_units = 0;
        if self.state != MachineState::NoFeatures {
            self.state = MachineState::NotReady;
            if self.activity == Activity::Active {
                self.active_time_started = now_ms;
            }
        }
        debug!("Machine monitoring restarted");
    }

    /// Activity line changed (or was polled) at `now_ms`
    ///
    /// Calls that do not change the activity are no-ops, so the tick can
    /// poll the line freely.
    pub fn check_activity(&mut self, level: Level, now_ms: u32) {
        if self.features.activity_line.is_none() {
            return;
        }

        let activity = if level == self.features.active_level {
            Activity::Active
        } else {
            Activity::Idle
        };

        match (self.activity, activity) {
            (Activity::Idle, Activity::Active) => {
                self.activity = Activity::Active;
                self.active_time_started = now_ms;
                trace!("Machine active");
            }
            (Activity::Active, Activity::Idle) => {
                self.accumulate(now_ms);
                self.activity = Activity::Idle;
                trace!("Machine idle, {} ms active", self.active_time_ms);
            }
            _ => {}
        }
    }

    /// Count completed work units
    pub fn inc_work_unit(&mut self, count: u32) {
        self.work_units = self.work_units.saturating_add(count);
        self.evaluate();
    }

    /// Current readiness, with active time brought up to `now_ms`
    pub fn is_ready(&mut self, now_ms: u32) -> MachineState {
        self.sync(now_ms);
        self.state
    }

    /// Check if the active-time target has been reached as of `now_ms`
    pub fn powered_time_expired(&mut self, now_ms: u32) -> bool {
        self.sync(now_ms);
        self.features.activity_line.is_some()
            && self.active_time_ms / 1000 >= self.active_time_target_s
    }

    /// Check if the work-unit target has been reached
    pub fn work_target_reached(&self) -> bool {
        self.features.work_line.is_some() && self.work_units >= self.work_unit_target
    }

    /// Set seconds of activity after which the machine needs oil
    pub fn set_active_time_target(&mut self, target_s: u32) -> Result<(), MachineError> {
        if self.features.activity_line.is_none() {
            return Err(MachineError::FeatureNotConfigured);
        }
        if target_s == 0 {
            return Err(MachineError::InvalidTarget);
        }
        self.active_time_target_s = target_s;
        Ok(())
    }

    /// Set work units after which the machine needs oil
    pub fn set_work_target(&mut self, target_units: u32) -> Result<(), MachineError> {
        if self.features.work_line.is_none() {
            return Err(MachineError::FeatureNotConfigured);
        }
        if target_units == 0 {
            return Err(MachineError::InvalidTarget);
        }
        self.work_unit_target = target_units;
        Ok(())
    }

    /// Fold the open active interval in, if any
    fn sync(&mut self, now_ms: u32) {
        if self.activity == Activity::Active {
            self.accumulate(now_ms);
        }
    }

    /// Close the current active interval at `now_ms` and open a new one
    fn accumulate(&mut self, now_ms: u32) {
        let elapsed = now_ms.wrapping_sub(self.active_time_started);
        self.active_time_ms = self.active_time_ms.saturating_add(elapsed);
        self.active_time_started = now_ms;
        self.evaluate();
    }

    /// NotReady -> Ready once either target is met; never the other way
    fn evaluate(&mut self) {
        if self.state != MachineState::NotReady {
            return;
        }
        let time_reached = self.features.activity_line.is_some()
            && self.active_time_ms / 1000 >= self.active_time_target_s;
        if time_reached || self.work_target_reached() {
            self.state = MachineState::Ready;
            debug!(
                "Machine ready: {} s active, {} work units",
                self.active_time_s(),
                self.work_units
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lathe() -> TargetMachine {
        TargetMachine::new(MachineFeatures {
            activity_line: Some(12),
            active_level: Level::High,
            work_line: Some(13),
            work_level: Level::Low,
        })
    }

    #[test]
    fn test_no_features() {
        let mut machine = TargetMachine::new(MachineFeatures::none());
        assert_eq!(machine.state(), MachineState::NoFeatures);

        machine.inc_work_unit(10);
        machine.restart_monitoring(0);
        assert_eq!(machine.is_ready(100_000), MachineState::NoFeatures);
        assert_eq!(
            machine.set_active_time_target(10),
            Err(MachineError::FeatureNotConfigured)
        );
        assert_eq!(
            machine.set_work_target(10),
            Err(MachineError::FeatureNotConfigured)
        );
    }

    #[test]
    fn test_work_units_make_ready() {
        let mut machine = lathe();
        machine.set_work_target(3).unwrap();

        machine.inc_work_unit(1);
        machine.inc_work_unit(1);
        assert_eq!(machine.state(), MachineState::NotReady);
        assert!(!machine.work_target_reached());

        machine.inc_work_unit(1);
        assert_eq!(machine.state(), MachineState::Ready);
        assert!(machine.work_target_reached());
    }

    #[test]
    fn test_active_time_accumulates_across_intervals() {
        let mut machine = lathe();
        machine.set_active_time_target(30).unwrap();

        machine.check_activity(Level::High, 1_000);
        machine.check_activity(Level::Low, 16_000);
        assert_eq!(machine.active_time_s(), 15);
        assert_eq!(machine.state(), MachineState::NotReady);

        // Idle time does not count
        machine.check_activity(Level::High, 100_000);
        machine.check_activity(Level::Low, 115_000);
        assert_eq!(machine.active_time_s(), 30);
        assert_eq!(machine.state(), MachineState::Ready);
    }

    #[test]
    fn test_query_folds_in_open_interval() {
        let mut machine = lathe();
        machine.set_active_time_target(30).unwrap();

        machine.check_activity(Level::High, 0);
        assert!(!machine.powered_time_expired(29_999));
        assert!(machine.powered_time_expired(30_000));
        assert_eq!(machine.is_ready(30_500), MachineState::Ready);
        assert_eq!(machine.active_time_s(), 30);
    }

    #[test]
    fn test_repeated_level_is_noop() {
        let mut machine = lathe();
        machine.check_activity(Level::High, 0);
        machine.check_activity(Level::High, 5_000);
        machine.check_activity(Level::Low, 10_000);
        assert_eq!(machine.active_time_s(), 10);

        machine.check_activity(Level::Low, 20_000);
        assert_eq!(machine.active_time_s(), 10);
    }

    #[test]
    fn test_restart_monitoring() {
        let mut machine = lathe();
        machine.inc_work_unit(5);
        machine.check_activity(Level::High, 0);
        assert_eq!(machine.is_ready(1_000), MachineState::Ready);

        machine.restart_monitoring(40_000);
        assert_eq!(machine.state(), MachineState::NotReady);
        assert_eq!(machine.work_units(), 0);
        assert_eq!(machine.active_time_s(), 0);

        // Still active: the interval restarted at 40 s, not at 0
        assert!(!machine.powered_time_expired(41_000));
        assert_eq!(machine.active_time_s(), 1);
    }

    #[test]
    fn test_active_low_line() {
        let mut machine = TargetMachine::new(MachineFeatures {
            activity_line: Some(12),
            active_level: Level::Low,
            work_line: None,
            work_level: Level::Low,
        });
        machine.check_activity(Level::Low, 0);
        assert_eq!(machine.activity(), Activity::Active);
        machine.check_activity(Level::High, 2_000);
        assert_eq!(machine.activity(), Activity::Idle);
        assert_eq!(machine.active_time_s(), 2);
    }

    #[test]
    fn test_zero_target_rejected() {
        let mut machine = lathe();
        assert_eq!(machine.set_work_target(0), Err(MachineError::InvalidTarget));
        assert_eq!(
            machine.set_active_time_target(0),
            Err(MachineError::InvalidTarget)
        );
    }

    #[test]
    fn test_from_config() {
        let config = MachineConfig {
            activity_line: None,
            work_line: Some(13),
            work_unit_target: 7,
            ..Default::default()
        };
        let machine = TargetMachine::from_config(&config).unwrap();
        assert_eq!(machine.work_unit_target(), 7);
        assert_eq!(machine.features().work_level, Level::Low);
        assert_eq!(machine.state(), MachineState::NotReady);
    }

    #[derive(Debug, Clone)]
    enum Input {
        Level(bool),
        Work(u32),
        Query,
    }

    fn input() -> impl Strategy<Value = (u32, Input)> {
        let kind = prop_oneof![
            any::<bool>().prop_map(Input::Level),
            (1u32..4).prop_map(Input::Work),
            Just(Input::Query),
        ];
        (0u32..5_000, kind)
    }

    proptest! {
        #[test]
        fn prop_readiness_is_monotone(inputs in proptest::collection::vec(input(), 1..60)) {
            let mut machine = lathe();
            machine.set_active_time_target(20).unwrap();
            machine.set_work_target(10).unwrap();

            let mut now = 0u32;
            let mut was_ready = false;
            for (delta, input) in inputs {
                now += delta;
                match input {
                    Input::Level(high) => machine.check_activity(Level::from(high), now),
                    Input::Work(n) => machine.inc_work_unit(n),
                    Input::Query => {
                        machine.is_ready(now);
                    }
                }
                let ready = machine.state() == MachineState::Ready;
                prop_assert!(!was_ready || ready);
                was_ready = ready;
            }
        }
    }
}
