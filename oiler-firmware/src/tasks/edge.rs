//! Line watchers
//!
//! One task per watched input line. Each edge is handed to the oiler,
//! which debounces it and routes it to a motor or the machine.

use defmt::*;

use oiler_hal_rp2040::{EdgeWatcher, MAX_WATCHERS};

use super::now_ms;
use crate::BoardOiler;

#[embassy_executor::task(pool_size = MAX_WATCHERS)]
pub async fn edge_task(oiler: &'static BoardOiler, mut watcher: EdgeWatcher) {
    let line = watcher.line();
    info!("Watching line {}", line);

    loop {
        let level = watcher.wait().await;
        let now = now_ms();

        let target = oiler.lock(|cell| cell.borrow_mut().on_edge(line, level, now));
        if let Some(target) = target {
            trace!("Line {} -> {}", line, target);
        }
    }
}
