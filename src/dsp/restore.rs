//! Restoration: DC correction, click removal, spectral noise reduction
//!
//! Click removal is a median/MAD outlier test over a sliding window. Noise
//! reduction is spectral subtraction with a static profile taken from the
//! first 10% of the buffer, assumed to be near-silence.

use crate::error::{invalid_param, Result};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

/// Guard against division by near-zero spectra
const EPSILON: f32 = 1e-10;

/// Fraction of the buffer used as the noise profile
const PROFILE_FRACTION: f32 = 0.1;

fn default_window_size() -> usize {
    21
}
fn default_click_threshold() -> f32 {
    3.0
}
fn default_reduction() -> f32 {
    1.0
}
fn default_smoothing() -> f32 {
    0.5
}

/// Click-removal parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickRemovalParams {
    /// Sliding window length in samples, odd, 3 to 101
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Outlier threshold in MAD multiples (0.5 to 10)
    #[serde(default = "default_click_threshold")]
    pub threshold: f32,
}

impl Default for ClickRemovalParams {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            threshold: default_click_threshold(),
        }
    }
}

impl ClickRemovalParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(3..=101).contains(&self.window_size) || self.window_size % 2 == 0 {
            return Err(invalid_param(
                "window_size",
                self.window_size,
                "odd, 3 to 101",
            ));
        }
        if !(0.5..=10.0).contains(&self.threshold) {
            return Err(invalid_param("threshold", self.threshold, "0.5 to 10.0"));
        }
        Ok(())
    }
}

/// Noise-reduction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseReductionParams {
    /// Subtraction strength (0 = no effect, 1 = full subtraction)
    #[serde(default = "default_reduction")]
    pub reduction: f32,
    /// How much each bin's gain is pulled toward the mask average (0 to 1)
    #[serde(default = "default_smoothing")]
    pub smoothing_factor: f32,
}

impl Default for NoiseReductionParams {
    fn default() -> Self {
        Self {
            reduction: default_reduction(),
            smoothing_factor: default_smoothing(),
        }
    }
}

impl NoiseReductionParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.reduction) {
            return Err(invalid_param("reduction", self.reduction, "0.0 to 1.0"));
        }
        if !(0.0..=1.0).contains(&self.smoothing_factor) {
            return Err(invalid_param(
                "smoothing_factor",
                self.smoothing_factor,
                "0.0 to 1.0",
            ));
        }
        Ok(())
    }
}

/// Remove constant offset by subtracting the buffer mean.
pub fn dc_correction(input: &[f32]) -> Vec<f32> {
    if input.is_empty() {
        return Vec::new();
    }
    let mean = input.iter().sum::<f32>() / input.len() as f32;
    input.iter().map(|&x| x - mean).collect()
}

fn median_of(sorted: &mut [f32]) -> f32 {
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted[sorted.len() / 2]
}

/// Replace impulsive outliers with the local median.
///
/// A sample is an outlier when its deviation from the window median exceeds
/// `threshold` times the window's median absolute deviation. A near-zero
/// MAD (flat window) suppresses replacement so clean silence is untouched.
pub fn click_removal(input: &[f32], params: &ClickRemovalParams) -> Result<Vec<f32>> {
    params.validate()?;

    if input.len() < params.window_size {
        return Ok(input.to_vec());
    }

    let half = params.window_size / 2;
    let mut output = input.to_vec();
    let mut window = Vec::with_capacity(params.window_size);
    let mut deviations = Vec::with_capacity(params.window_size);

    for i in 0..input.len() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(input.len());

        window.clear();
        window.extend_from_slice(&input[lo..hi]);
        let median = median_of(&mut window);

        deviations.clear();
        deviations.extend(input[lo..hi].iter().map(|&x| (x - median).abs()));
        let mad = median_of(&mut deviations);

        if mad > EPSILON && (input[i] - median).abs() > params.threshold * mad {
            output[i] = median;
        }
    }

    Ok(output)
}

/// Spectral subtraction against a profile taken from the buffer's first 10%.
///
/// The profile segment is zero-padded to the full length before its forward
/// transform, and its magnitudes rescaled by `len / segment_len` so the
/// padding does not dilute the estimate. The per-bin gain is
/// `1 - reduction * |noise| / |signal|` clamped to [0, 1], then blended with
/// its own average by `smoothing_factor` to soften musical-noise artifacts.
/// The profile is static, so non-stationary noise is only partially removed.
pub fn noise_reduction(input: &[f32], params: &NoiseReductionParams) -> Result<Vec<f32>> {
    params.validate()?;

    let len = input.len();
    let profile_len = (len as f32 * PROFILE_FRACTION) as usize;
    if profile_len < 2 {
        return Ok(input.to_vec());
    }

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(len);
    let inverse = planner.plan_fft_inverse(len);

    let mut signal: Vec<Complex<f32>> = input.iter().map(|&s| Complex::new(s, 0.0)).collect();
    forward.process(&mut signal);

    let mut noise: Vec<Complex<f32>> = input[..profile_len]
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)).take(len - profile_len))
        .collect();
    forward.process(&mut noise);

    let profile_scale = len as f32 / profile_len as f32;
    let noise_mags: Vec<f32> = noise.iter().map(|c| c.norm() * profile_scale).collect();

    let mut mask: Vec<f32> = signal
        .iter()
        .zip(&noise_mags)
        .map(|(s, &n)| (1.0 - params.reduction * n / (s.norm() + EPSILON)).clamp(0.0, 1.0))
        .collect();

    let mean_gain = mask.iter().sum::<f32>() / mask.len() as f32;
    for gain in &mut mask {
        *gain = *gain * (1.0 - params.smoothing_factor) + mean_gain * params.smoothing_factor;
    }

    for (bin, &gain) in signal.iter_mut().zip(&mask) {
        *bin *= gain;
    }
    inverse.process(&mut signal);

    let norm = 1.0 / len as f32;
    Ok(signal.iter().map(|c| c.re * norm).collect())
}
