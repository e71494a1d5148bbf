//! Line-change event routing
//!
//! Every watched input line has one route: the edge polarity it cares
//! about, who consumes the event, and a debounce window. Edge callbacks
//! from the platform go through [`EdgeDispatcher::route`], which filters
//! them and names the consumer; the oiler then applies the event.

mod debounce;

pub use debounce::{Debounce, DEFAULT_DEBOUNCE_MS};

use heapless::Vec;
use oiler_hal::{Level, LineId, Polarity};

use crate::config::MAX_MOTORS;

/// Routes: one work line per motor plus the machine's two lines
pub const MAX_ROUTES: usize = MAX_MOTORS + 2;

/// Consumer of an accepted edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeTarget {
    /// Drip sensor of the motor in this slot
    MotorWork(usize),
    /// Machine completed a unit of work
    MachineWork,
    /// Machine started or stopped
    MachineActivity,
}

/// Dispatcher errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    RouteTableFull,
    /// Line already has a consumer
    LineInUse,
}

/// Route for one watched line
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineRoute {
    pub line: LineId,
    pub polarity: Polarity,
    pub target: EdgeTarget,
    debounce: Debounce,
}

/// Filters raw edges and names their consumer
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeDispatcher {
    routes: Vec<LineRoute, MAX_ROUTES>,
    debounce_ms: u32,
    discarded: u32,
}

impl EdgeDispatcher {
    pub const fn new(debounce_ms: u32) -> Self {
        Self {
            routes: Vec::new(),
            debounce_ms,
            discarded: 0,
        }
    }

    pub fn debounce_ms(&self) -> u32 {
        self.debounce_ms
    }

    /// Edges dropped by debouncing so far
    pub fn discarded(&self) -> u32 {
        self.discarded
    }

    /// Check if `count` more routes fit
    pub fn has_room(&self, count: usize) -> bool {
        self.routes.len() + count <= MAX_ROUTES
    }

    /// Check if no route uses `line`
    pub fn is_free(&self, line: LineId) -> bool {
        self.routes.iter().all(|r| r.line != line)
    }

    /// Add a route for `line`
    pub fn add_route(
        &mut self,
        line: LineId,
        polarity: Polarity,
        target: EdgeTarget,
    ) -> Result<(), DispatchError> {
        if !self.is_free(line) {
            return Err(DispatchError::LineInUse);
        }
        self.routes
            .push(LineRoute {
                line,
                polarity,
                target,
                debounce: Debounce::new(self.debounce_ms),
            })
            .map_err(|_| DispatchError::RouteTableFull)
    }

    /// Filter an edge on `line`, which just changed to `level`
    ///
    /// Returns the consumer if the edge matches the route's polarity and
    /// clears its debounce window. Unknown lines are ignored.
    pub fn route(&mut self, line: LineId, level: Level, now_ms: u32) -> Option<EdgeTarget> {
        let route = self.routes.iter_mut().find(|r| r.line == line)?;
        if !route.polarity.matches(level) {
            return None;
        }
        if !route.debounce.accept(now_ms) {
            self.discarded = self.discarded.wrapping_add(1);
            trace!("Edge on line {} discarded", line);
            return None;
        }
        Some(route.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> EdgeDispatcher {
        let mut dispatcher = EdgeDispatcher::new(DEFAULT_DEBOUNCE_MS);
        dispatcher
            .add_route(17, Polarity::Rising, EdgeTarget::MotorWork(0))
            .unwrap();
        dispatcher
            .add_route(12, Polarity::Either, EdgeTarget::MachineActivity)
            .unwrap();
        dispatcher
    }

    #[test]
    fn test_bounce_counted_once() {
        let mut dispatcher = dispatcher();
        assert_eq!(
            dispatcher.route(17, Level::High, 1_000),
            Some(EdgeTarget::MotorWork(0))
        );
        assert_eq!(dispatcher.route(17, Level::High, 1_050), None);
        assert_eq!(dispatcher.discarded(), 1);
    }

    #[test]
    fn test_polarity_filter() {
        let mut dispatcher = dispatcher();
        assert_eq!(dispatcher.route(17, Level::Low, 0), None);
        // A wrong-polarity edge does not open a debounce window
        assert_eq!(
            dispatcher.route(17, Level::High, 10),
            Some(EdgeTarget::MotorWork(0))
        );
        assert_eq!(dispatcher.discarded(), 0);
    }

    #[test]
    fn test_lines_debounced_independently() {
        let mut dispatcher = dispatcher();
        assert!(dispatcher.route(17, Level::High, 0).is_some());
        assert_eq!(
            dispatcher.route(12, Level::High, 20),
            Some(EdgeTarget::MachineActivity)
        );
        assert!(dispatcher.route(12, Level::Low, 200).is_some());
    }

    #[test]
    fn test_unknown_line_ignored() {
        let mut dispatcher = dispatcher();
        assert_eq!(dispatcher.route(3, Level::High, 0), None);
    }

    #[test]
    fn test_line_in_use() {
        let mut dispatcher = dispatcher();
        assert_eq!(
            dispatcher.add_route(17, Polarity::Falling, EdgeTarget::MachineWork),
            Err(DispatchError::LineInUse)
        );
        assert!(!dispatcher.is_free(12));
        assert!(dispatcher.is_free(13));
    }

    #[test]
    fn test_table_full() {
        let mut dispatcher = EdgeDispatcher::new(0);
        assert!(dispatcher.has_room(MAX_ROUTES));
        for line in 0..MAX_ROUTES as LineId {
            dispatcher
                .add_route(line, Polarity::Rising, EdgeTarget::MachineWork)
                .unwrap();
        }
        assert!(dispatcher.has_room(0));
        assert!(!dispatcher.has_room(1));
        assert_eq!(
            dispatcher.add_route(30, Polarity::Rising, EdgeTarget::MachineWork),
            Err(DispatchError::RouteTableFull)
        );
    }
}
