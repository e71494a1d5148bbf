//! Periodic tick registration

use crate::HalError;

/// Periodic-tick source
///
/// After registration the platform calls the core's tick handler once per
/// period on a best-effort basis. Registering twice is the caller's bug;
/// implementations may reject it.
pub trait TickService {
    /// Start delivering ticks every `period_ms` milliseconds
    fn register_tick(&mut self, period_ms: u32) -> Result<(), HalError>;
}
