use crate::models::error::CaptureError;
use crate::models::state::{CaptureState, TickOutcome};

/// Event sink for capture session notifications.
///
/// All methods are called synchronously from inside the session's tick;
/// implementations should queue work for the display layer rather than
/// doing it inline.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called after every successful tick.
    fn on_tick(&self, outcome: &TickOutcome);

    /// Called when a capture session dies on an error, after the source
    /// handle has been released.
    fn on_error(&self, error: &CaptureError);
}
