//! RP2040 implementation of the oiler platform
//!
//! Outputs are claimed from the [`PinBank`] the first time a line is
//! written. Watched inputs become [`EdgeWatcher`]s, which the firmware
//! drains with [`Rp2040Board::take_watchers`] and runs as async tasks.
//! Input levels seen by the watchers are mirrored in [`LINE_LEVELS`] so
//! `read()` never has to touch a pin a watcher owns.

use embassy_rp::gpio::{Input, Level as PinLevel, Output, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use heapless::Vec;
use oiler_hal::{EdgeService, HalError, Level, LineId, LineIo, LineMode, Polarity, TickService};
use portable_atomic::{AtomicU32, Ordering};

use crate::pins::{PinBank, PinError};

/// Watched input lines (one work sensor per motor plus two machine lines)
pub const MAX_WATCHERS: usize = 4;

/// Output lines (two steppers, a relay and the alert)
const MAX_OUTPUTS: usize = 12;

/// Last seen level of every watched input, one bit per GPIO
pub static LINE_LEVELS: AtomicU32 = AtomicU32::new(0);

/// Requested tick period (ms), picked up by the firmware's tick task
pub static TICK_REQUEST: Signal<CriticalSectionRawMutex, u32> = Signal::new();

impl From<PinError> for HalError {
    fn from(e: PinError) -> Self {
        match e {
            PinError::InvalidPin => HalError::InvalidLine,
            PinError::AlreadyTaken => HalError::LineInUse,
        }
    }
}

fn pin_level(level: Level) -> PinLevel {
    match level {
        Level::High => PinLevel::High,
        Level::Low => PinLevel::Low,
    }
}

fn pull(mode: LineMode) -> Pull {
    match mode {
        LineMode::Input => Pull::None,
        LineMode::PullUp => Pull::Up,
        LineMode::PullDown => Pull::Down,
    }
}

fn line_mask(line: LineId) -> u32 {
    1u32.checked_shl(u32::from(line)).unwrap_or(0)
}

fn record_level(line: LineId, level: Level) {
    let mask = line_mask(line);
    match level {
        Level::High => LINE_LEVELS.fetch_or(mask, Ordering::Relaxed),
        Level::Low => LINE_LEVELS.fetch_and(!mask, Ordering::Relaxed),
    };
}

/// A watched input line
pub struct EdgeWatcher {
    line: LineId,
    polarity: Polarity,
    input: Input<'static>,
}

impl EdgeWatcher {
    pub fn line(&self) -> LineId {
        self.line
    }

    /// Wait for the next edge of the registered polarity
    ///
    /// Returns the level the line changed to.
    pub async fn wait(&mut self) -> Level {
        let level = match self.polarity {
            Polarity::Rising => {
                self.input.wait_for_rising_edge().await;
                Level::High
            }
            Polarity::Falling => {
                self.input.wait_for_falling_edge().await;
                Level::Low
            }
            Polarity::Either => {
                self.input.wait_for_any_edge().await;
                Level::from(self.input.is_high())
            }
        };
        record_level(self.line, level);
        level
    }
}

/// The oiler board
pub struct Rp2040Board {
    bank: PinBank,
    outputs: Vec<(LineId, Output<'static>), MAX_OUTPUTS>,
    watchers: Vec<EdgeWatcher, MAX_WATCHERS>,
}

impl Rp2040Board {
    pub fn new(bank: PinBank) -> Self {
        Self {
            bank,
            outputs: Vec::new(),
            watchers: Vec::new(),
        }
    }

    /// Hand over the watchers registered so far
    pub fn take_watchers(&mut self) -> Vec<EdgeWatcher, MAX_WATCHERS> {
        core::mem::take(&mut self.watchers)
    }
}

impl LineIo for Rp2040Board {
    fn read(&self, line: LineId) -> Level {
        if let Some((_, output)) = self.outputs.iter().find(|(l, _)| *l == line) {
            return Level::from(output.is_set_high());
        }
        Level::from(LINE_LEVELS.load(Ordering::Relaxed) & line_mask(line) != 0)
    }

    fn write(&mut self, line: LineId, level: Level) {
        if let Some((_, output)) = self.outputs.iter_mut().find(|(l, _)| *l == line) {
            output.set_level(pin_level(level));
            return;
        }

        if self.outputs.is_full() {
            #[cfg(feature = "defmt")]
            defmt::warn!("No room for output line {}", line);
            return;
        }
        match self.bank.take(line) {
            Ok(pin) => {
                let output = Output::new(pin, pin_level(level));
                let _ = self.outputs.push((line, output));
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Output line {} unavailable: {}", line, _e);
            }
        }
    }
}

impl EdgeService for Rp2040Board {
    fn register_edge(
        &mut self,
        line: LineId,
        polarity: Polarity,
        mode: LineMode,
    ) -> Result<(), HalError> {
        if self.watchers.is_full() {
            return Err(HalError::NoCapacity);
        }

        let input = Input::new(self.bank.take(line)?, pull(mode));
        record_level(line, Level::from(input.is_high()));
        self.watchers
            .push(EdgeWatcher {
                line,
                polarity,
                input,
            })
            .map_err(|_| HalError::NoCapacity)
    }
}

impl TickService for Rp2040Board {
    fn register_tick(&mut self, period_ms: u32) -> Result<(), HalError> {
        TICK_REQUEST.signal(period_ms);
        Ok(())
    }
}
