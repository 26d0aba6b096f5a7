use thiserror::Error;

/// Errors that can occur during acquisition and analysis.
///
/// Every variant is fatal to the running capture session: the session closes
/// its source handle, drops back to idle, and surfaces the error to the
/// caller exactly once. Nothing here is retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("no device selected")]
    DeviceNotAvailable,

    #[error("device i/o failed: {0}")]
    DeviceIo(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("sample stream ended")]
    StreamEnded,

    #[error("spectrum analysis failed: {0}")]
    Analysis(String),
}
