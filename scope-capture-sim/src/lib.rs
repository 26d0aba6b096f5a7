//! # scope-capture-sim
//!
//! Synthetic signal backend for scope-capture-kit.
//!
//! Provides:
//! - `SynthSource` — deterministic two-channel quadrature waveform generator
//!   implementing `SampleSource` and `DeviceAttributes`
//!
//! Stands in for real acquisition hardware in demos and tests: the stream it
//! produces has the same packed little-endian layout a two-channel 16-bit
//! ADC delivers, so the whole capture path (demux, rings, spectrum) runs
//! unchanged against it.
//!
//! ## Usage
//! ```ignore
//! use scope_capture_core::{CaptureConfig, CaptureSession};
//! use scope_capture_sim::SynthSource;
//!
//! let mut session = CaptureSession::new(SynthSource::continuous(42));
//! session.arm(CaptureConfig::default(), SynthSource::descriptors())?;
//! let outcome = session.advance()?; // one scheduler tick
//! ```

pub mod synth;

pub use synth::SynthSource;
