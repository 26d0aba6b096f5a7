use std::sync::Arc;

use crate::models::channel::{self, ChannelDescriptor};
use crate::models::config::{CaptureConfig, PlotKind};
use crate::models::diagnostics::CaptureDiagnostics;
use crate::models::error::CaptureError;
use crate::models::state::{CaptureState, TickOutcome};
use crate::processing::demux;
use crate::processing::raw_buffer::RawBuffer;
use crate::processing::ring::ChannelRings;
use crate::processing::spectrum::SpectrumAnalyzer;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::sample_source::{AcquisitionMode, DeviceInfo, SampleSource};

/// Tick-driven acquisition session.
///
/// Owns the raw byte buffer, the per-channel display rings, and the spectrum
/// analyzer, and drives a `SampleSource` one bounded unit of work per
/// `advance` call. An external scheduler (UI idle callback, timer) supplies
/// the ticks; the session itself never blocks or sleeps.
///
/// ```text
/// [SampleSource] → [RawBuffer] ─→ demux ─→ [ChannelRings]            (time)
///                              └→ full block → [SpectrumAnalyzer]    (frequency)
/// ```
///
/// Any read or analysis failure tears the session down: the source handle is
/// closed, the state returns to idle, and the error is surfaced exactly
/// once. Arming again is the only way to resume.
pub struct CaptureSession<S: SampleSource> {
    source: S,
    descriptors: Vec<ChannelDescriptor>,
    config: CaptureConfig,
    state: CaptureState,
    raw: RawBuffer,
    rings: Option<ChannelRings>,
    analyzer: SpectrumAnalyzer,
    spectrum: Vec<f32>,
    frequency_axis: Vec<f32>,
    stride: usize,
    source_open: bool,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    diagnostics: CaptureDiagnostics,
}

impl<S: SampleSource> CaptureSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            descriptors: Vec::new(),
            config: CaptureConfig::default(),
            state: CaptureState::Idle,
            raw: RawBuffer::new(0),
            rings: None,
            analyzer: SpectrumAnalyzer::new(),
            spectrum: Vec::new(),
            frequency_axis: Vec::new(),
            stride: 0,
            source_open: false,
            delegate: None,
            diagnostics: CaptureDiagnostics::default(),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.source.device_info()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        let mut d = self.diagnostics;
        d.plan_rebuilds = self.analyzer.plan_rebuilds();
        d
    }

    /// Prepare a capture: validate the channel set against the requested
    /// mode, size the buffers, and open continuous sources.
    ///
    /// Only legal from idle. On any error the session stays idle with no
    /// handle held.
    pub fn arm(
        &mut self,
        config: CaptureConfig,
        descriptors: Vec<ChannelDescriptor>,
    ) -> Result<(), CaptureError> {
        if !self.state.is_idle() {
            return Err(CaptureError::InvalidConfiguration(
                "can only arm from idle state".into(),
            ));
        }
        config.validate().map_err(CaptureError::InvalidConfiguration)?;

        let active = channel::active_count(&descriptors);
        let stride = channel::sample_stride(&descriptors);
        if active == 0 {
            return Err(CaptureError::InvalidConfiguration(
                "no active channels".into(),
            ));
        }
        match config.kind {
            PlotKind::Frequency => {
                if active != 1 {
                    return Err(CaptureError::InvalidConfiguration(format!(
                        "spectral capture needs exactly one active channel, got {}",
                        active
                    )));
                }
                // The analyzer decodes 16-bit words; wider or narrower
                // channels have no defined spectral layout here.
                if stride != 2 {
                    return Err(CaptureError::InvalidConfiguration(format!(
                        "spectral capture supports 2-byte channels only, got a stride of {}",
                        stride
                    )));
                }
            }
            PlotKind::Constellation => {
                if active != 2 {
                    return Err(CaptureError::InvalidConfiguration(format!(
                        "constellation capture needs exactly two active channels, got {}",
                        active
                    )));
                }
            }
            PlotKind::Time => {}
        }
        for desc in &descriptors {
            if desc.enabled && !matches!(desc.bytes, 1 | 2 | 4) {
                log::warn!(
                    "channel {} has unsupported sample width {} and will be skipped",
                    desc.name,
                    desc.bytes
                );
            }
        }

        self.raw = RawBuffer::new(config.sample_count * stride);
        self.rings = None;
        self.spectrum.clear();
        self.frequency_axis.clear();
        if config.kind.is_time_domain() {
            self.rings = Some(ChannelRings::new(active, config.sample_count));
        } else {
            self.spectrum = vec![0.0; config.sample_count / 2];
            self.frequency_axis = (0..config.sample_count / 2)
                .map(|i| {
                    SpectrumAnalyzer::bin_frequency(i, config.sample_count, config.sample_rate_hz)
                        as f32
                })
                .collect();
        }

        if self.source.mode() == AcquisitionMode::Continuous {
            self.source.open(self.raw.capacity())?;
            self.source_open = true;
        }

        self.stride = stride;
        self.descriptors = descriptors;
        self.config = config;
        self.diagnostics = CaptureDiagnostics::default();
        self.set_state(CaptureState::Armed);
        log::info!(
            "armed {:?} capture: {} channels, stride {} bytes, {} samples",
            config.kind,
            active,
            stride,
            config.sample_count
        );
        Ok(())
    }

    /// Perform one bounded unit of acquisition work.
    ///
    /// Reads the source once, then either demuxes whatever whole samples are
    /// available (time domain) or checks for a complete block to analyze
    /// (frequency domain). On failure the session is torn down before the
    /// error is returned; subsequent calls report the session as unarmed.
    pub fn advance(&mut self) -> Result<TickOutcome, CaptureError> {
        match self.state {
            CaptureState::Idle => {
                return Err(CaptureError::InvalidConfiguration(
                    "session is not armed".into(),
                ))
            }
            CaptureState::Armed => self.set_state(CaptureState::Running),
            CaptureState::Running => {}
        }
        self.diagnostics.ticks += 1;

        let outcome = if self.config.kind.is_time_domain() {
            self.tick_time()
        } else {
            self.tick_spectral()
        };
        match outcome {
            Ok(outcome) => {
                if let Some(delegate) = &self.delegate {
                    delegate.on_tick(&outcome);
                }
                Ok(outcome)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Stop an active capture and release the source handle.
    ///
    /// The rings are discarded; their shape depends on the armed channel set
    /// and cannot be reused across reconfiguration. The last spectrum stays
    /// readable until the next arm replaces it.
    pub fn stop(&mut self) {
        if self.state.is_idle() {
            return;
        }
        log::info!("capture stopped");
        self.teardown();
    }

    /// Ring contents for one channel in storage order, while time-domain
    /// capture is armed.
    pub fn trace(&self, channel: usize) -> Option<&[f32]> {
        self.rings
            .as_ref()
            .filter(|r| channel < r.channel_count())
            .map(|r| r.channel(channel))
    }

    /// Ring contents for one channel, oldest sample first.
    pub fn trace_ordered(&self, channel: usize) -> Option<Vec<f32>> {
        self.rings
            .as_ref()
            .filter(|r| channel < r.channel_count())
            .map(|r| r.ordered(channel))
    }

    /// Next ring slot the demultiplexer will fill.
    pub fn ring_cursor(&self) -> usize {
        self.rings.as_ref().map(|r| r.cursor()).unwrap_or(0)
    }

    /// Magnitudes of the most recent spectral block; all zero until the
    /// first block completes, empty outside spectral capture.
    pub fn spectrum(&self) -> &[f32] {
        &self.spectrum
    }

    /// Frequency-axis values matching `spectrum`, in Hz.
    pub fn frequency_axis(&self) -> &[f32] {
        &self.frequency_axis
    }

    /// Update the sampling rate and rescale the frequency axis in place.
    ///
    /// Safe at any time; the rate only affects axis labeling, never the
    /// capture itself.
    pub fn set_sample_rate(&mut self, sample_rate_hz: f64) {
        self.config.sample_rate_hz = sample_rate_hz;
        let n = self.config.sample_count;
        for (i, x) in self.frequency_axis.iter_mut().enumerate() {
            *x = SpectrumAnalyzer::bin_frequency(i, n, sample_rate_hz) as f32;
        }
    }

    fn set_state(&mut self, state: CaptureState) {
        if self.state == state {
            return;
        }
        self.state = state;
        if let Some(delegate) = &self.delegate {
            delegate.on_state_changed(&state);
        }
    }

    fn teardown(&mut self) {
        if self.source_open {
            self.source.close();
            self.source_open = false;
        }
        self.rings = None;
        self.raw.clear();
        self.set_state(CaptureState::Idle);
    }

    fn fail(&mut self, err: CaptureError) -> CaptureError {
        log::error!("capture aborted: {}", err);
        self.teardown();
        if let Some(delegate) = &self.delegate {
            delegate.on_error(&err);
        }
        err
    }

    /// One read from the source into the raw buffer, honoring the
    /// acquisition mode.
    fn read_tick(&mut self) -> Result<(), CaptureError> {
        let n = match self.source.mode() {
            AcquisitionMode::Continuous => {
                let n = self.source.read(self.raw.free_tail())?;
                if n == 0 {
                    return Err(CaptureError::StreamEnded);
                }
                n
            }
            AcquisitionMode::OneShot => {
                self.source.open(self.raw.capacity())?;
                self.source_open = true;
                let result = self.source.read(self.raw.free_tail());
                self.source.close();
                self.source_open = false;
                let n = result?;
                if n == 0 {
                    return Err(CaptureError::DeviceIo(
                        "one-shot read returned no data".into(),
                    ));
                }
                n
            }
        };
        self.raw.commit(n);
        self.diagnostics.bytes_read += n as u64;
        Ok(())
    }

    fn tick_time(&mut self) -> Result<TickOutcome, CaptureError> {
        self.read_tick()?;

        let n = self.raw.available() / self.stride;
        if n == 0 {
            return Ok(TickOutcome::Pending);
        }
        let Some(rings) = self.rings.as_mut() else {
            return Err(CaptureError::InvalidConfiguration(
                "time-domain capture without rings".into(),
            ));
        };

        demux::demux_block(self.raw.bytes(), rings, n, &self.descriptors);
        rings.advance(n);
        if self.raw.consume(n * self.stride) {
            self.diagnostics.compactions += 1;
        }
        self.diagnostics.samples_demuxed += n as u64;
        Ok(TickOutcome::TraceUpdated(n))
    }

    fn tick_spectral(&mut self) -> Result<TickOutcome, CaptureError> {
        self.read_tick()?;

        if !self.raw.is_full() {
            return Ok(TickOutcome::Pending);
        }
        let magnitudes = self.analyzer.analyze(self.raw.bytes())?;
        self.spectrum.copy_from_slice(magnitudes);
        self.raw.clear();
        self.diagnostics.spectra_computed += 1;
        Ok(TickOutcome::SpectrumReady)
    }
}

impl<S: SampleSource> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        if self.source_open {
            self.source.close();
        }
    }
}
