//! # scope-capture-core
//!
//! Platform-agnostic signal acquisition and analysis core.
//!
//! Reads packed multi-channel sample streams from a device backend, demuxes
//! them into per-channel display traces, and computes log-power spectra.
//! Device backends implement the `SampleSource` trait and plug into the
//! generic `CaptureSession`, which an external scheduler drives one bounded
//! tick at a time.
//!
//! ## Architecture
//!
//! ```text
//! scope-capture-core (this crate)
//! ├── traits/       ← SampleSource, DeviceAttributes, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfig, ChannelDescriptor, ...
//! ├── processing/   ← RawBuffer, ChannelRings, demux, SpectrumAnalyzer
//! └── session/      ← CaptureSession (tick-driven orchestrator)
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::channel::{
    active_count, parse_channel_table, sample_stride, ChannelDescriptor, Endianness,
};
pub use models::config::{CaptureConfig, PlotKind};
pub use models::diagnostics::CaptureDiagnostics;
pub use models::error::CaptureError;
pub use models::state::{CaptureState, TickOutcome};
pub use processing::demux::{demux_block, sign_extend};
pub use processing::raw_buffer::RawBuffer;
pub use processing::ring::ChannelRings;
pub use processing::spectrum::SpectrumAnalyzer;
pub use session::capture::CaptureSession;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::device_attrs::{read_sampling_frequency, DeviceAttributes};
pub use traits::sample_source::{AcquisitionMode, DeviceInfo, SampleSource};
