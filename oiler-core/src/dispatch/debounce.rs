//! Per-line edge debouncing

/// Default minimum spacing between accepted edges on one line (ms)
pub const DEFAULT_DEBOUNCE_MS: u32 = 150;

/// Rejects edges that follow the last accepted edge too closely
///
/// Spacing is measured from the last *accepted* edge, so a line that
/// chatters continuously still produces one event per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debounce {
    min_spacing_ms: u32,
    last_accepted: Option<u32>,
}

impl Debounce {
    pub const fn new(min_spacing_ms: u32) -> Self {
        Self {
            min_spacing_ms,
            last_accepted: None,
        }
    }

    pub fn min_spacing_ms(&self) -> u32 {
        self.min_spacing_ms
    }

    /// Decide whether an edge at `now_ms` is genuine
    pub fn accept(&mut self, now_ms: u32) -> bool {
        if let Some(last) = self.last_accepted {
            if now_ms.wrapping_sub(last) < self.min_spacing_ms {
                return false;
            }
        }
        self.last_accepted = Some(now_ms);
        true
    }
}
