use basket_core::Timestamp;

/// Port for time abstraction
///
/// The engine reads the host's block timestamp through this port:
/// - Real system time for production
/// - A manually advanced block clock for simulation
/// - Fixed time for deterministic tests
pub trait Clock: Send + Sync {
    /// Get the current time according to this clock
    fn now(&self) -> Timestamp;

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
