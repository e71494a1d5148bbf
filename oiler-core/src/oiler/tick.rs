//! Periodic scheduling check

use oiler_hal::Platform;

use super::{Oiler, OilerEvent, OilerMode};
use crate::traits::MotorControl;

impl<P: Platform> Oiler<'_, P> {
    /// Run the mode-specific scheduling check
    ///
    /// Called once per [`super::TICK_PERIOD_MS`]. Does nothing while the
    /// oiler is off.
    pub fn tick(&mut self, now_ms: u32) {
        if !self.status.is_scheduling() {
            return;
        }

        match self.mode {
            OilerMode::OnElapsedTime => self.tick_elapsed(now_ms),
            OilerMode::OnPoweredTime | OilerMode::OnTargetActivity => self.tick_machine(now_ms),
        }
    }

    /// Restart motors whose interval has passed and flag late batches
    ///
    /// A running motor is late once it has run for its delivery budget,
    /// which defaults to the oil interval itself.
    fn tick_elapsed(&mut self, now_ms: u32) {
        let Some(interval) = self.threshold.interval_ms() else {
            return;
        };

        let mut restarted = false;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.motor.is_running() {
                let budget = slot.budget_ms(interval);
                let running = slot.motor.time_running(now_ms);
                if running >= budget {
                    if let Some(alert) = self.alert.as_mut() {
                        alert.check(running, budget, &mut self.platform);
                    }
                }
            } else if slot.motor.time_since_stopped(now_ms) >= interval {
                slot.start(now_ms, &mut self.platform);
                restarted = true;
                debug!("Motor {} restarted", i);
            }
        }

        if restarted {
            self.status = self.status.transition(OilerEvent::MotorRestarted);
        }
    }

    /// Start a cycle once the machine reaches its target
    ///
    /// A trigger that fires while the previous cycle is still oiling counts
    /// as a failure; failures are checked against the target by the alert.
    fn tick_machine(&mut self, now_ms: u32) {
        let Some(machine) = self.machine else {
            return;
        };

        let mode = self.mode;
        let platform = &self.platform;
        let reached = machine.lock(|cell| {
            let mut machine = cell.borrow_mut();
            if let Some(line) = machine.features().activity_line {
                machine.check_activity(platform.read(line), now_ms);
            }
            match mode {
                OilerMode::OnPoweredTime => machine.powered_time_expired(now_ms),
                OilerMode::OnTargetActivity => machine.work_target_reached(),
                OilerMode::OnElapsedTime => false,
            }
        });
        if !reached {
            return;
        }

        if self.status == super::OilerStatus::Oiling {
            self.failures = self.failures.saturating_add(1);
            warn!("Trigger refired while oiling ({} failures)", self.failures);
            self.check_error(self.failures, self.threshold.target_value());
        }
        if let Err(e) = self.on(now_ms) {
            warn!("Cycle start failed: {}", e);
        }
    }
}
