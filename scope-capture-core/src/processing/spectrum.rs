//! Windowed log-power spectrum of captured sample blocks.

use std::f64::consts::PI;
use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::models::error::CaptureError;

/// Display calibration offset applied to every magnitude bin, in dB.
pub const CALIBRATION_OFFSET_DB: f64 = -50.0;

/// Hann window weight for index `j` of an `n`-point window.
pub fn hann(j: usize, n: usize) -> f64 {
    let a = 2.0 * PI / (n - 1) as f64;
    0.5 * (1.0 - (a * j as f64).cos())
}

/// Everything that is only valid for one block length.
struct Plan {
    size: usize,
    fft: Arc<dyn RealToComplex<f64>>,
    window: Vec<f64>,
    input: Vec<f64>,
    output: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
    magnitudes: Vec<f32>,
}

/// Forward real-to-complex spectrum analyzer with a cached transform plan.
///
/// The plan, window coefficients, and scratch buffers are sized to one block
/// length. They are torn down and rebuilt whenever a block of a different
/// length arrives, so for the common case of a stable transform size the
/// per-tick cost is just the transform itself.
pub struct SpectrumAnalyzer {
    planner: RealFftPlanner<f64>,
    plan: Option<Plan>,
    plan_rebuilds: u64,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: RealFftPlanner::new(),
            plan: None,
            plan_rebuilds: 0,
        }
    }

    /// Times the cached plan has been (re)built since construction.
    pub fn plan_rebuilds(&self) -> u64 {
        self.plan_rebuilds
    }

    /// Magnitudes from the most recent analysis; empty before the first one.
    pub fn magnitudes(&self) -> &[f32] {
        self.plan.as_ref().map(|p| p.magnitudes.as_slice()).unwrap_or(&[])
    }

    /// Frequency-axis value of bin `i` for an `n`-point transform.
    pub fn bin_frequency(i: usize, n: usize, sample_rate_hz: f64) -> f64 {
        i as f64 * sample_rate_hz / n as f64
    }

    /// Analyze one full block of packed samples.
    ///
    /// The block is interpreted as native-endian signed 16-bit values; the
    /// session only arms spectral capture for a single 2-byte channel, which
    /// is the one layout the supported hardware produces here. Each sample
    /// is weighted by the Hann window, transformed, and folded into
    /// `10·log10(power / n²)` dB per bin plus the fixed calibration offset.
    /// The returned slice holds `n/2` bins and stays valid until the next
    /// call.
    pub fn analyze(&mut self, block: &[u8]) -> Result<&[f32], CaptureError> {
        let size = block.len() / 2;
        if size < 2 {
            return Err(CaptureError::Analysis(format!(
                "block of {} bytes is too short to transform",
                block.len()
            )));
        }

        if self.plan.as_ref().map(|p| p.size) != Some(size) {
            self.rebuild_plan(size);
        }
        let Some(plan) = self.plan.as_mut() else {
            return Err(CaptureError::Analysis("transform plan unavailable".into()));
        };

        for ((slot, w), word) in plan
            .input
            .iter_mut()
            .zip(&plan.window)
            .zip(block.chunks_exact(2))
        {
            *slot = i16::from_ne_bytes([word[0], word[1]]) as f64 * w;
        }

        plan.fft
            .process_with_scratch(&mut plan.input, &mut plan.output, &mut plan.scratch)
            .map_err(|e| CaptureError::Analysis(e.to_string()))?;

        let denom = (size * size) as f64;
        for (mag, bin) in plan.magnitudes.iter_mut().zip(&plan.output) {
            let power = (bin.re * bin.re + bin.im * bin.im) / denom;
            *mag = (10.0 * power.log10() + CALIBRATION_OFFSET_DB) as f32;
        }

        Ok(&plan.magnitudes)
    }

    fn rebuild_plan(&mut self, size: usize) {
        let fft = self.planner.plan_fft_forward(size);
        self.plan = Some(Plan {
            size,
            input: fft.make_input_vec(),
            output: fft.make_output_vec(),
            scratch: fft.make_scratch_vec(),
            window: (0..size).map(|j| hann(j, size)).collect(),
            magnitudes: vec![0.0; size / 2],
            fft,
        });
        self.plan_rebuilds += 1;
        log::debug!("rebuilt transform plan for {} samples", size);
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn block_from(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    #[test]
    fn hann_window_shape() {
        let n = 17;
        assert_relative_eq!(hann(0, n), 0.0);
        assert_relative_eq!(hann(n - 1, n), 0.0, epsilon = 1e-12);
        // Odd length puts the exact peak on the middle coefficient.
        assert_relative_eq!(hann(8, n), 1.0, epsilon = 1e-12);
        // Symmetry.
        assert_relative_eq!(hann(3, n), hann(n - 4, n), epsilon = 1e-12);
    }

    #[test]
    fn plan_is_rebuilt_only_on_size_changes() {
        let mut analyzer = SpectrumAnalyzer::new();
        for size in [1024usize, 1024, 2048, 1024] {
            analyzer.analyze(&vec![0u8; size * 2]).unwrap();
        }
        // First use, the change to 2048, and the change back.
        assert_eq!(analyzer.plan_rebuilds(), 3);
    }

    #[test]
    fn magnitude_count_is_half_the_block_length() {
        let mut analyzer = SpectrumAnalyzer::new();
        let out = analyzer.analyze(&vec![0u8; 256]).unwrap();
        assert_eq!(out.len(), 64);
        assert_eq!(analyzer.magnitudes().len(), 64);
    }

    #[test]
    fn tone_peaks_at_its_own_bin() {
        let n = 64;
        let tone_bin = 8;
        let samples: Vec<i16> = (0..n)
            .map(|j| {
                let theta = 2.0 * PI * tone_bin as f64 * j as f64 / n as f64;
                (16384.0 * theta.cos()) as i16
            })
            .collect();

        let mut analyzer = SpectrumAnalyzer::new();
        let out = analyzer.analyze(&block_from(&samples)).unwrap();

        let peak = out
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, tone_bin);
    }

    #[test]
    fn dc_magnitude_matches_the_closed_form() {
        let n = 32usize;
        let level = 1000i16;
        let samples = vec![level; n];

        let mut analyzer = SpectrumAnalyzer::new();
        let out = analyzer.analyze(&block_from(&samples)).unwrap();

        // Bin 0 of a constant block is level times the window sum.
        let window_sum: f64 = (0..n).map(|j| hann(j, n)).sum();
        let power = (level as f64 * window_sum).powi(2) / (n * n) as f64;
        let expected = 10.0 * power.log10() + CALIBRATION_OFFSET_DB;
        assert_relative_eq!(out[0] as f64, expected, epsilon = 1e-4);
    }

    #[test]
    fn undersized_block_is_rejected() {
        let mut analyzer = SpectrumAnalyzer::new();
        assert!(matches!(
            analyzer.analyze(&[0u8; 2]),
            Err(CaptureError::Analysis(_))
        ));
        assert!(matches!(
            analyzer.analyze(&[]),
            Err(CaptureError::Analysis(_))
        ));
    }

    #[test]
    fn bin_frequency_scales_with_sample_rate() {
        assert_relative_eq!(SpectrumAnalyzer::bin_frequency(0, 1024, 1.0e6), 0.0);
        assert_relative_eq!(
            SpectrumAnalyzer::bin_frequency(512, 1024, 1.0e6),
            500_000.0
        );
    }
}
