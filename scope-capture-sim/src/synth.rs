//! Deterministic quadrature waveform generator.

use std::collections::HashMap;
use std::f64::consts::PI;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use scope_capture_core::models::channel::{ChannelDescriptor, Endianness};
use scope_capture_core::models::error::CaptureError;
use scope_capture_core::traits::device_attrs::DeviceAttributes;
use scope_capture_core::traits::sample_source::{AcquisitionMode, DeviceInfo, SampleSource};

const AMPLITUDE: f64 = 4096.0;
/// Phase advance per sample; one full turn every 200 samples.
const PHASE_STEP: f64 = PI / 100.0;

/// Two-channel quadrature test signal source.
///
/// Generates interleaved little-endian `i16` samples: channel 0 is
/// `4096·cos(θ)` with ±250 counts of noise, channel 1 is `4096·sin(θ)` with
/// ±500. The phase carries across reads, so a streaming consumer sees one
/// continuous waveform regardless of how the reads are sized.
pub struct SynthSource {
    info: DeviceInfo,
    rng: SmallRng,
    offset: u64,
    is_open: bool,
    attrs: HashMap<String, i64>,
    sample_rate_hz: f64,
}

impl SynthSource {
    /// Streaming variant, behaving like a buffered ADC.
    pub fn continuous(seed: u64) -> Self {
        Self::with_device("synth-adc-lpc", seed)
    }

    /// One-shot variant: a full open/read/close cycle per captured block.
    pub fn one_shot(seed: u64) -> Self {
        Self::with_device("cf-ad9250-synth", seed)
    }

    /// Source for an arbitrary device name; the acquisition mode follows
    /// the known-hardware name mapping.
    pub fn with_device(name: &str, seed: u64) -> Self {
        Self {
            info: DeviceInfo::from_name(name),
            rng: SmallRng::seed_from_u64(seed),
            offset: 0,
            is_open: false,
            attrs: HashMap::new(),
            sample_rate_hz: 246_760_000.0,
        }
    }

    /// Override the reported `sampling_frequency` attribute.
    pub fn set_sample_rate(&mut self, sample_rate_hz: f64) {
        self.sample_rate_hz = sample_rate_hz;
    }

    /// Wire-format descriptors matching the generated stream.
    pub fn descriptors() -> Vec<ChannelDescriptor> {
        ["in_voltage0", "in_voltage1"]
            .iter()
            .map(|name| ChannelDescriptor {
                name: (*name).to_string(),
                enabled: true,
                bytes: 2,
                shift: 0,
                mask: 0xFFFF,
                is_signed: true,
                bits_used: 16,
                endianness: Endianness::Little,
            })
            .collect()
    }

    fn next_frame(&mut self) -> [i16; 2] {
        let theta = self.offset as f64 * PHASE_STEP;
        let i = AMPLITUDE * theta.cos() + self.rng.gen_range(-250..250) as f64;
        let q = AMPLITUDE * theta.sin() + self.rng.gen_range(-500..500) as f64;
        self.offset += 1;
        [i as i16, q as i16]
    }
}

impl SampleSource for SynthSource {
    fn mode(&self) -> AcquisitionMode {
        self.info.mode
    }

    fn open(&mut self, block_size_bytes: usize) -> Result<(), CaptureError> {
        if self.is_open {
            return Err(CaptureError::DeviceIo("buffer already open".into()));
        }
        self.write_int("buffer/length", block_size_bytes as i64)?;
        self.write_int("buffer/enable", 1)?;
        self.is_open = true;
        log::debug!("{}: buffer opened for {} bytes", self.info.name, block_size_bytes);
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        if !self.is_open {
            return Err(CaptureError::DeviceIo("buffer not open".into()));
        }
        let frames = buf.len() / 4;
        for f in 0..frames {
            let [i, q] = self.next_frame();
            buf[f * 4..f * 4 + 2].copy_from_slice(&i.to_le_bytes());
            buf[f * 4 + 2..f * 4 + 4].copy_from_slice(&q.to_le_bytes());
        }
        Ok(frames * 4)
    }

    fn close(&mut self) {
        if !self.is_open {
            return;
        }
        let _ = self.write_int("buffer/enable", 0);
        self.is_open = false;
        log::debug!("{}: buffer closed", self.info.name);
    }

    fn device_info(&self) -> DeviceInfo {
        self.info.clone()
    }
}

impl DeviceAttributes for SynthSource {
    fn write_int(&mut self, name: &str, value: i64) -> Result<(), CaptureError> {
        self.attrs.insert(name.to_string(), value);
        Ok(())
    }

    fn read_double(&self, name: &str) -> Result<f64, CaptureError> {
        if name == "sampling_frequency" {
            return Ok(self.sample_rate_hz);
        }
        self.attrs
            .get(name)
            .map(|v| *v as f64)
            .ok_or_else(|| CaptureError::DeviceIo(format!("no such attribute: {}", name)))
    }

    fn has_attr(&self, name: &str) -> bool {
        name == "sampling_frequency" || self.attrs.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scope_capture_core::models::config::{CaptureConfig, PlotKind};
    use scope_capture_core::models::state::TickOutcome;
    use scope_capture_core::session::capture::CaptureSession;
    use scope_capture_core::traits::device_attrs::read_sampling_frequency;

    #[test]
    fn stream_is_packed_little_endian_quadrature() {
        let mut source = SynthSource::continuous(7);
        source.open(32).unwrap();

        let mut buf = [0u8; 32];
        assert_eq!(source.read(&mut buf).unwrap(), 32);

        let ch0 = i16::from_le_bytes([buf[0], buf[1]]);
        let ch1 = i16::from_le_bytes([buf[2], buf[3]]);
        // θ = 0: cosine at full amplitude, sine near zero, both within the
        // configured noise bands.
        assert!((ch0 as f64 - AMPLITUDE).abs() <= 250.0);
        assert!((ch1 as f64).abs() <= 500.0);
    }

    #[test]
    fn phase_is_continuous_across_reads() {
        let mut split = SynthSource::continuous(3);
        let mut whole = SynthSource::continuous(3);
        split.open(16).unwrap();
        whole.open(16).unwrap();

        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        split.read(&mut a[..8]).unwrap();
        split.read(&mut a[8..]).unwrap();
        whole.read(&mut b).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn same_seed_means_same_stream() {
        let mut first = SynthSource::continuous(99);
        let mut second = SynthSource::continuous(99);
        first.open(64).unwrap();
        second.open(64).unwrap();

        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        first.read(&mut a).unwrap();
        second.read(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mode_follows_the_device_name() {
        assert_eq!(SynthSource::continuous(0).mode(), AcquisitionMode::Continuous);
        assert_eq!(SynthSource::one_shot(0).mode(), AcquisitionMode::OneShot);
    }

    #[test]
    fn read_requires_an_open_buffer() {
        let mut source = SynthSource::continuous(0);
        let mut buf = [0u8; 4];
        assert!(matches!(
            source.read(&mut buf),
            Err(CaptureError::DeviceIo(_))
        ));
    }

    #[test]
    fn open_and_close_drive_the_buffer_attributes() {
        let mut source = SynthSource::continuous(0);
        source.open(128).unwrap();
        assert_eq!(source.read_double("buffer/length").unwrap(), 128.0);
        assert_eq!(source.read_double("buffer/enable").unwrap(), 1.0);

        source.close();
        assert_eq!(source.read_double("buffer/enable").unwrap(), 0.0);
    }

    #[test]
    fn reports_its_sampling_frequency() {
        let mut source = SynthSource::continuous(0);
        source.set_sample_rate(61_440_000.0);
        assert_eq!(read_sampling_frequency(&source), 61_440_000.0);
    }

    #[test]
    fn session_captures_a_time_trace_end_to_end() {
        let mut session = CaptureSession::new(SynthSource::continuous(5));
        let config = CaptureConfig {
            kind: PlotKind::Time,
            sample_count: 64,
            sample_rate_hz: 1.0e6,
        };
        session.arm(config, SynthSource::descriptors()).unwrap();

        assert_eq!(session.advance().unwrap(), TickOutcome::TraceUpdated(64));

        let trace = session.trace_ordered(0).unwrap();
        assert_eq!(trace.len(), 64);
        // Every decoded value stays inside amplitude plus noise.
        assert!(trace.iter().all(|v| v.abs() <= AMPLITUDE as f32 + 500.0));
        // A quarter turn in, the cosine channel has visibly decayed from
        // its full-scale start.
        assert!(trace[0] > 3000.0);
        assert!(trace[50].abs() < 1500.0);
    }

    #[test]
    fn session_computes_a_spectrum_end_to_end() {
        // The generated stream is two interleaved channels; a single-channel
        // spectral capture over it sees every word as a sample, which is
        // fine for exercising the path.
        let mut descriptors = SynthSource::descriptors();
        descriptors.remove(1);

        let mut session = CaptureSession::new(SynthSource::continuous(11));
        let config = CaptureConfig {
            kind: PlotKind::Frequency,
            sample_count: 256,
            sample_rate_hz: 1.0e6,
        };
        session.arm(config, descriptors).unwrap();

        let mut ready = false;
        for _ in 0..8 {
            if session.advance().unwrap() == TickOutcome::SpectrumReady {
                ready = true;
                break;
            }
        }
        assert!(ready);
        assert_eq!(session.spectrum().len(), 128);
        assert!(session.spectrum().iter().all(|m| m.is_finite()));
    }

    #[test]
    fn one_shot_session_captures_blocks() {
        let mut session = CaptureSession::new(SynthSource::one_shot(13));
        let config = CaptureConfig {
            kind: PlotKind::Time,
            sample_count: 16,
            sample_rate_hz: 1.0e6,
        };
        session.arm(config, SynthSource::descriptors()).unwrap();

        assert_eq!(session.advance().unwrap(), TickOutcome::TraceUpdated(16));
        assert_eq!(session.advance().unwrap(), TickOutcome::TraceUpdated(16));
    }
}
