use serde::{Deserialize, Serialize};

/// What the capture session computes each sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    /// Per-channel time-domain traces.
    Time,
    /// Two-channel XY trace; shares the time-domain capture path.
    Constellation,
    /// Log-power spectrum of a single channel.
    Frequency,
}

impl PlotKind {
    /// Time-domain captures demux into rings; spectral captures hand whole
    /// blocks to the analyzer.
    pub fn is_time_domain(self) -> bool {
        matches!(self, Self::Time | Self::Constellation)
    }
}

/// Configuration for a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub kind: PlotKind,

    /// Samples per channel in time mode; transform block length in
    /// frequency mode.
    pub sample_count: usize,

    /// ADC sampling rate in Hz, used to scale the frequency axis.
    pub sample_rate_hz: f64,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_count == 0 {
            return Err("sample count must be positive".into());
        }
        if self.kind == PlotKind::Frequency && !self.sample_count.is_power_of_two() {
            return Err(format!(
                "transform size must be a power of two, got {}",
                self.sample_count
            ));
        }
        if self.sample_rate_hz <= 0.0 {
            return Err("sample rate must be positive".into());
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            kind: PlotKind::Time,
            sample_count: 400,
            sample_rate_hz: 1.0,
        }
    }
}
