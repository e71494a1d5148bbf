//! The oiler scheduler
//!
//! Owns a small pool of dispensing motors and decides when they run.
//! Three scheduling modes are supported:
//!
//! - [`OilerMode::OnElapsedTime`]: restart each motor a fixed interval
//!   after it last stopped
//! - [`OilerMode::OnPoweredTime`]: oil after the machine has been active
//!   for a target number of seconds
//! - [`OilerMode::OnTargetActivity`]: oil after the machine has completed
//!   a target number of work units
//!
//! A cycle ends when every motor has counted its work target on its drip
//! sensor. Cycles that take too long, or triggers that refire while a
//! cycle is still running, are reported on the alert line.
//!
//! The oiler is driven from two places: [`Oiler::on_edge`] for line
//! changes and [`Oiler::tick`] once per [`TICK_PERIOD_MS`]. Both must be
//! called with the [`SharedOiler`] lock held.

mod alert;
mod slot;
mod status;
mod tick;

pub use alert::Alert;
pub use slot::MotorSlot;
pub use status::{OilerEvent, OilerStatus};

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;
use oiler_hal::{HalError, Level, LineId, LineMode, Platform, Polarity};

use crate::config::{ConfigError, MotorConfig, OilerConfig, DEFAULT_OIL_INTERVAL_S, MAX_MOTORS};
use crate::dispatch::{DispatchError, EdgeDispatcher, EdgeTarget};
use crate::machine::{MachineError, SharedMachine, TargetMachine};
use crate::traits::{Direction, MotorControl, MotorState};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Period of the scheduling tick
pub const TICK_PERIOD_MS: u32 = 1000;

/// Oiler shared between edge callbacks and the tick
pub type SharedOiler<'m, P> = Mutex<CriticalSectionRawMutex, RefCell<Oiler<'m, P>>>;

/// What triggers an oiling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OilerMode {
    /// Fixed interval after each motor stops
    #[default]
    OnElapsedTime,
    /// Seconds of machine activity
    OnPoweredTime,
    /// Machine work units
    OnTargetActivity,
}

impl OilerMode {
    /// Check if this mode is gated on the target machine
    pub fn needs_machine(&self) -> bool {
        !matches!(self, OilerMode::OnElapsedTime)
    }
}

/// Scheduling threshold, interpreted by mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Threshold {
    /// Time-based modes (ms)
    Interval(u32),
    /// Activity mode
    WorkUnits(u32),
}

impl Threshold {
    pub fn interval_ms(&self) -> Option<u32> {
        match *self {
            Threshold::Interval(ms) => Some(ms),
            Threshold::WorkUnits(_) => None,
        }
    }

    /// Target in the units the mode is configured in (seconds or work units)
    pub fn target_value(&self) -> u32 {
        match *self {
            Threshold::Interval(ms) => ms / 1000,
            Threshold::WorkUnits(n) => n,
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Interval(DEFAULT_OIL_INTERVAL_S * 1000)
    }
}

/// Oiler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OilerError {
    /// `on()` with no motors registered
    NoMotors,
    /// Motor pool is at capacity
    PoolFull,
    /// Mode needs a target machine and none is attached
    NoMachine,
    /// A machine is already attached
    MachineAttached,
    /// Mode needs a machine line that was never configured
    FeatureNotConfigured,
    /// Targets must be at least 1
    InvalidTarget,
    /// No motor in this slot
    InvalidIndex,
    RouteTableFull,
    /// Line already has a consumer
    LineInUse,
    Hal(HalError),
    Config(ConfigError),
}

impl From<MachineError> for OilerError {
    fn from(e: MachineError) -> Self {
        match e {
            MachineError::FeatureNotConfigured => OilerError::FeatureNotConfigured,
            MachineError::InvalidTarget => OilerError::InvalidTarget,
        }
    }
}

impl From<DispatchError> for OilerError {
    fn from(e: DispatchError) -> Self {
        match e {
            DispatchError::RouteTableFull => OilerError::RouteTableFull,
            DispatchError::LineInUse => OilerError::LineInUse,
        }
    }
}

impl From<HalError> for OilerError {
    fn from(e: HalError) -> Self {
        OilerError::Hal(e)
    }
}

impl From<ConfigError> for OilerError {
    fn from(e: ConfigError) -> Self {
        OilerError::Config(e)
    }
}

/// Lubrication scheduler
pub struct Oiler<'m, P: Platform> {
    platform: P,
    machine: Option<&'m SharedMachine>,
    mode: OilerMode,
    threshold: Threshold,
    status: OilerStatus,
    slots: Vec<MotorSlot, MAX_MOTORS>,
    dispatcher: EdgeDispatcher,
    alert: Option<Alert>,
    /// Triggers that refired mid-cycle since the last completed cycle
    failures: u32,
    time_stopped: u32,
    tick_registered: bool,
}

impl<'m, P: Platform> Oiler<'m, P> {
    /// Create an oiler in elapsed-time mode with no motors
    pub fn new(platform: P, debounce_ms: u32) -> Self {
        Self {
            platform,
            machine: None,
            mode: OilerMode::OnElapsedTime,
            threshold: Threshold::default(),
            status: OilerStatus::Off,
            slots: Vec::new(),
            dispatcher: EdgeDispatcher::new(debounce_ms),
            alert: None,
            failures: 0,
            time_stopped: 0,
            tick_registered: false,
        }
    }

    /// Build a fully wired oiler from a configuration
    ///
    /// The oiler is left `Off`; call [`Oiler::on`] to start scheduling.
    pub fn from_config(
        config: &OilerConfig,
        platform: P,
        machine: Option<&'m SharedMachine>,
    ) -> Result<Self, OilerError> {
        config.validate()?;

        let mut oiler = Self::new(platform, config.debounce_ms);
        if let Some(machine) = machine {
            oiler.attach_machine(machine)?;
        }
        for motor in &config.motors {
            oiler.register_motor(motor)?;
        }
        oiler.set_mode(config.mode, config.target)?;
        if let Some(alert) = config.alert {
            oiler.set_alert(alert.line, alert.multiple);
        }
        Ok(oiler)
    }

    /// Wrap the oiler for sharing with interrupt-context callbacks
    pub fn into_shared(self) -> SharedOiler<'m, P> {
        Mutex::new(RefCell::new(self))
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Monitor `machine` for activity and work
    ///
    /// Registers the machine's lines with the edge service and routes
    /// their events.
    pub fn attach_machine(&mut self, machine: &'m SharedMachine) -> Result<(), OilerError> {
        if self.machine.is_some() {
            return Err(OilerError::MachineAttached);
        }

        let features = machine.lock(|cell| *cell.borrow().features());
        let routes = [
            features
                .activity_line
                .map(|line| (line, Polarity::Either, EdgeTarget::MachineActivity)),
            features.work_line.map(|line| {
                (line, Polarity::towards(features.work_level), EdgeTarget::MachineWork)
            }),
        ];

        if features.activity_line.is_some() && features.activity_line == features.work_line {
            return Err(OilerError::LineInUse);
        }
        for &(line, _, _) in routes.iter().flatten() {
            if !self.dispatcher.is_free(line) {
                return Err(OilerError::LineInUse);
            }
        }
        if !self.dispatcher.has_room(routes.iter().flatten().count()) {
            return Err(OilerError::RouteTableFull);
        }

        // Routes are added only once every line is watched
        for &(line, polarity, _) in routes.iter().flatten() {
            self.platform
                .register_edge(line, polarity, LineMode::PullUp)?;
        }
        for &(line, polarity, target) in routes.iter().flatten() {
            self.dispatcher.add_route(line, polarity, target)?;
        }

        self.machine = Some(machine);
        info!("Machine attached");
        Ok(())
    }

    /// Add a motor to the pool and start counting its drips
    ///
    /// Returns the slot index.
    pub fn register_motor(&mut self, config: &MotorConfig) -> Result<usize, OilerError> {
        if self.slots.is_full() {
            return Err(OilerError::PoolFull);
        }
        if config.work_target == 0 {
            return Err(OilerError::InvalidTarget);
        }
        if !self.dispatcher.is_free(config.work_line) {
            return Err(OilerError::LineInUse);
        }

        self.platform
            .register_edge(config.work_line, Polarity::Rising, LineMode::PullUp)?;

        let index = self.slots.len();
        self.dispatcher
            .add_route(config.work_line, Polarity::Rising, EdgeTarget::MotorWork(index))?;

        let slot = MotorSlot::new(config);
        slot.motor.release(&mut self.platform);
        self.slots.push(slot).map_err(|_| OilerError::PoolFull)?;

        info!("Motor {} registered, work line {}", index, config.work_line);
        Ok(index)
    }

    /// Choose the scheduling mode and its target
    ///
    /// `target` is seconds for the time modes and work units for
    /// [`OilerMode::OnTargetActivity`]. Nothing changes on failure.
    pub fn set_mode(&mut self, mode: OilerMode, target: u32) -> Result<(), OilerError> {
        if target == 0 {
            return Err(OilerError::InvalidTarget);
        }

        let threshold = match mode {
            OilerMode::OnElapsedTime => Threshold::Interval(target.saturating_mul(1000)),
            OilerMode::OnPoweredTime => {
                self.machine_op(|m| m.set_active_time_target(target))?;
                Threshold::Interval(target.saturating_mul(1000))
            }
            OilerMode::OnTargetActivity => {
                self.machine_op(|m| m.set_work_target(target))?;
                Threshold::WorkUnits(target)
            }
        };

        self.mode = mode;
        self.threshold = threshold;
        debug!("Mode {}, target {}", mode, target);
        Ok(())
    }

    /// Configure the alert output
    ///
    /// A `multiple` of 0 disables the alert. The new line starts deasserted.
    pub fn set_alert(&mut self, line: LineId, multiple: u32) {
        if let Some(old) = self.alert.as_mut() {
            old.clear(&mut self.platform);
        }
        let mut alert = Alert::new(line, multiple);
        alert.clear(&mut self.platform);
        self.alert = Some(alert);
    }

    /// Start an oiling cycle
    ///
    /// Motors that are stopped start with a zeroed drip counter; motors
    /// still running carry on with their current count.
    pub fn on(&mut self, now_ms: u32) -> Result<(), OilerError> {
        if self.slots.is_empty() {
            return Err(OilerError::NoMotors);
        }
        if !self.tick_registered {
            self.platform.register_tick(TICK_PERIOD_MS)?;
            self.tick_registered = true;
        }

        for slot in self.slots.iter_mut() {
            if !slot.motor.is_running() {
                slot.start(now_ms, &mut self.platform);
            }
        }
        if self.mode.needs_machine() {
            self.with_machine(|m| m.restart_monitoring(now_ms));
        }

        self.status = self.status.transition(OilerEvent::Start);
        info!("Oiling started");
        Ok(())
    }

    /// Stop all motors and stop scheduling
    pub fn off(&mut self, now_ms: u32) {
        for slot in self.slots.iter_mut() {
            if slot.motor.is_running() {
                slot.motor.off(now_ms, &mut self.platform);
            }
        }
        self.time_stopped = now_ms;
        self.status = self.status.transition(OilerEvent::Stop);
        info!("Oiler off");
    }

    /// Handle a change of `line` to `level`
    ///
    /// Returns the consumer if the edge was accepted.
    pub fn on_edge(&mut self, line: LineId, level: Level, now_ms: u32) -> Option<EdgeTarget> {
        let target = self.dispatcher.route(line, level, now_ms)?;
        match target {
            EdgeTarget::MotorWork(slot) => {
                if let Err(e) = self.on_motor_work(slot, now_ms) {
                    warn!("Work edge for slot {}: {}", slot, e);
                }
            }
            EdgeTarget::MachineWork => {
                self.with_machine(|m| m.inc_work_unit(1));
            }
            EdgeTarget::MachineActivity => {
                self.with_machine(|m| m.check_activity(level, now_ms));
            }
        }
        Some(target)
    }

    /// Count one drop from the motor in `slot`
    ///
    /// Stops the motor once it reaches its work target; the cycle completes
    /// when the last running motor stops.
    pub fn on_motor_work(&mut self, slot: usize, now_ms: u32) -> Result<(), OilerError> {
        let s = self.slots.get_mut(slot).ok_or(OilerError::InvalidIndex)?;
        if !s.count_work() {
            return Ok(());
        }

        s.motor.off(now_ms, &mut self.platform);
        debug!("Motor {} delivered {} drops", slot, s.work_count);

        if self.slots.iter().all(|s| !s.motor.is_running()) {
            self.complete_cycle(now_ms);
        }
        Ok(())
    }

    /// Assert the alert if `actual` has overrun `target` by the alert multiple
    pub fn check_error(&mut self, actual: u32, target: u32) {
        if let Some(alert) = self.alert.as_mut() {
            alert.check(actual, target, &mut self.platform);
        }
    }

    /// Deassert the alert
    pub fn clear_error(&mut self) {
        if let Some(alert) = self.alert.as_mut() {
            alert.clear(&mut self.platform);
        }
    }

    /// Run one motor (or all, with `None`) forwards
    pub fn set_motors_forward(&mut self, index: Option<usize>) -> Result<(), OilerError> {
        self.set_motors_direction(index, Direction::Forward)
    }

    /// Run one motor (or all, with `None`) backwards
    pub fn set_motors_backward(&mut self, index: Option<usize>) -> Result<(), OilerError> {
        self.set_motors_direction(index, Direction::Backward)
    }

    pub fn status(&self) -> OilerStatus {
        self.status
    }

    pub fn mode(&self) -> OilerMode {
        self.mode
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn motor_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[MotorSlot] {
        &self.slots
    }

    pub fn motor_state(&self, index: usize) -> Option<MotorState> {
        self.slots.get(index).map(|s| s.motor.state())
    }

    pub fn motor_direction(&self, index: usize) -> Option<Direction> {
        self.slots.get(index).map(|s| s.motor.direction())
    }

    pub fn motor_work_count(&self, index: usize) -> Option<u32> {
        self.slots.get(index).map(|s| s.work_count)
    }

    /// When the last cycle ended or the oiler was switched off
    pub fn time_stopped(&self) -> u32 {
        self.time_stopped
    }

    /// Whole seconds since the last cycle ended, or 0 while oiling
    pub fn time_idle_s(&self, now_ms: u32) -> u32 {
        match self.status {
            OilerStatus::Oiling => 0,
            _ => now_ms.wrapping_sub(self.time_stopped) / 1000,
        }
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.as_ref()
    }

    pub fn alert_asserted(&self) -> bool {
        self.alert.is_some_and(|a| a.is_asserted())
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn dispatcher(&self) -> &EdgeDispatcher {
        &self.dispatcher
    }

    fn set_motors_direction(
        &mut self,
        index: Option<usize>,
        dir: Direction,
    ) -> Result<(), OilerError> {
        match index {
            Some(i) => self
                .slots
                .get_mut(i)
                .ok_or(OilerError::InvalidIndex)?
                .motor
                .set_direction(dir),
            None => self
                .slots
                .iter_mut()
                .for_each(|s| s.motor.set_direction(dir)),
        }
        Ok(())
    }

    fn complete_cycle(&mut self, now_ms: u32) {
        self.clear_error();
        self.failures = 0;
        if self.mode.needs_machine() {
            self.with_machine(|m| m.restart_monitoring(now_ms));
        }
        self.time_stopped = now_ms;
        self.status = self.status.transition(OilerEvent::AllStopped);
        info!("Oiling cycle complete");
    }

    fn with_machine<R>(&self, f: impl FnOnce(&mut TargetMachine) -> R) -> Option<R> {
        self.machine
            .map(|machine| machine.lock(|cell| f(&mut cell.borrow_mut())))
    }

    fn machine_op(
        &self,
        f: impl FnOnce(&mut TargetMachine) -> Result<(), MachineError>,
    ) -> Result<(), OilerError> {
        self.with_machine(f).ok_or(OilerError::NoMachine)??;
        Ok(())
    }
}
