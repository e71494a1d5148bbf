//! Embassy async tasks
//!
//! Every task reaches the scheduler through the shared oiler; none of them
//! hold the lock across an await.

pub mod edge;
pub mod stepper;
pub mod tick;

pub use edge::edge_task;
pub use stepper::stepper_task;
pub use tick::tick_task;

use embassy_time::Instant;

/// Milliseconds since boot, wrapping
pub fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}
