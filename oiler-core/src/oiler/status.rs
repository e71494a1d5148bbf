//! Oiler status machine

/// What the oiler is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OilerStatus {
    /// Not scheduling; ticks are ignored
    #[default]
    Off,
    /// At least one motor is delivering oil
    Oiling,
    /// Scheduling, waiting for the next trigger
    Idle,
}

/// Events that move the oiler between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OilerEvent {
    /// `on()` started the motors
    Start,
    /// The tick restarted a stopped motor
    MotorRestarted,
    /// The last running motor reached its work target
    AllStopped,
    /// `off()` stopped everything
    Stop,
}

impl OilerStatus {
    /// Check if the scheduler reacts to ticks
    pub fn is_scheduling(&self) -> bool {
        !matches!(self, OilerStatus::Off)
    }

    /// Process an event and return the next status
    pub fn transition(self, event: OilerEvent) -> Self {
        use OilerEvent::*;
        use OilerStatus::*;

        match (self, event) {
            (_, Start) => Oiling,
            (_, Stop) => Off,
            (Idle, MotorRestarted) => Oiling,
            (Oiling, AllStopped) => Idle,
            _ => self,
        }
    }
}
