//! Scheduling tick
//!
//! Waits for the oiler to register its tick, then calls `Oiler::tick`
//! once per requested period.

use defmt::*;
use embassy_time::{Duration, Ticker};

use oiler_hal_rp2040::TICK_REQUEST;

use super::now_ms;
use crate::BoardOiler;

#[embassy_executor::task]
pub async fn tick_task(oiler: &'static BoardOiler) {
    info!("Tick task started");

    let period_ms = TICK_REQUEST.wait().await;
    info!("Ticking every {} ms", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));
    loop {
        ticker.next().await;

        let now = now_ms();
        oiler.lock(|cell| cell.borrow_mut().tick(now));
    }
}
