//! Clock collaborator: the single source of "now".
//!
//! Nothing else in the crate reads the system time. Growth state and task
//! dates are computed against whatever clock the [`Engine`](crate::engine::Engine)
//! was built with, so tests can pin the date.

use jiff::{Timestamp, Zoned, civil::Date};

pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;

    /// The current calendar date.
    fn today(&self) -> Date;
}

/// Reads the system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn today(&self) -> Date {
        Zoned::now().date()
    }
}

/// A clock pinned to one zoned instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    at: Zoned,
}

impl FixedClock {
    pub fn new(at: Zoned) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.at.timestamp()
    }

    fn today(&self) -> Date {
        self.at.date()
    }
}
