//! In-memory platform for host tests

use heapless::Vec;
use oiler_hal::{EdgeService, HalError, Level, LineId, LineIo, LineMode, Polarity, TickService};

const LINES: usize = 32;

/// Records every line write, edge registration and tick registration
pub struct MockPlatform {
    levels: [Level; LINES],
    pub edges: Vec<(LineId, Polarity), 8>,
    pub tick_period_ms: Option<u32>,
    pub tick_registrations: u32,
    pub refuse_edges: bool,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            levels: [Level::Low; LINES],
            edges: Vec::new(),
            tick_period_ms: None,
            tick_registrations: 0,
            refuse_edges: false,
        }
    }

    /// Current level of a line
    pub fn level(&self, line: LineId) -> Level {
        self.levels[line as usize]
    }

    /// Set an input level as if driven externally
    pub fn set_input(&mut self, line: LineId, level: Level) {
        self.levels[line as usize] = level;
    }
}

impl LineIo for MockPlatform {
    fn read(&self, line: LineId) -> Level {
        self.levels[line as usize]
    }

    fn write(&mut self, line: LineId, level: Level) {
        self.levels[line as usize] = level;
    }
}

impl EdgeService for MockPlatform {
    fn register_edge(
        &mut self,
        line: LineId,
        polarity: Polarity,
        _mode: LineMode,
    ) -> Result<(), HalError> {
        if self.refuse_edges || line as usize >= LINES {
            return Err(HalError::InvalidLine);
        }
        self.edges
            .push((line, polarity))
            .map_err(|_| HalError::NoCapacity)
    }
}

impl TickService for MockPlatform {
    fn register_tick(&mut self, period_ms: u32) -> Result<(), HalError> {
        self.tick_period_ms = Some(period_ms);
        self.tick_registrations += 1;
        Ok(())
    }
}
