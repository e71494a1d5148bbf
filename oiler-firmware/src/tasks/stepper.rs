//! Stepper coil task
//!
//! Mirrors each stepped motor's run state into a coil sequencer and
//! writes the resulting patterns to its lines.

use defmt::*;
use embassy_time::{Duration, Ticker};

use oiler_core::config::MAX_MOTORS;
use oiler_core::motor::Motor;
use oiler_drivers::stepper::FourPinSequencer;

use crate::BoardOiler;

/// Sequencer update period; must be shorter than one step at top speed
const STEP_UPDATE_MS: u32 = 1;

#[embassy_executor::task]
pub async fn stepper_task(oiler: &'static BoardOiler) {
    info!("Stepper task started");

    let mut sequencers: [FourPinSequencer; MAX_MOTORS] =
        core::array::from_fn(|_| FourPinSequencer::new(0));
    let mut ticker = Ticker::every(Duration::from_millis(STEP_UPDATE_MS as u64));

    loop {
        ticker.next().await;

        oiler.lock(|cell| {
            let mut oiler = cell.borrow_mut();
            for (i, seq) in sequencers.iter_mut().enumerate() {
                let Some(Motor::Stepped(motor)) = oiler.slots().get(i).map(|s| &s.motor) else {
                    continue;
                };
                seq.follow(motor);
                let lines = motor.lines();

                if let Some(pattern) = seq.update_with_delta(STEP_UPDATE_MS) {
                    FourPinSequencer::write_coils(lines, pattern, oiler.platform_mut());
                }
            }
        });
    }
}
