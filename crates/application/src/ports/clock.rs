//! Clock port

use chrono::{DateTime, Utc};

/// Port for getting the current time.
///
/// Used to timestamp issued tokens; tests supply a fixed clock.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
