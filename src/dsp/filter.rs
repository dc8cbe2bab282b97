//! IIR filter primitives
//!
//! Butterworth-family low-pass/high-pass/band-pass cascades applied
//! zero-phase (forward-backward), plus the shelf/peaking helpers used by the
//! 3-band equalizer. Biquad sections use the Audio EQ Cookbook formulas.
//! Reference: https://www.w3.org/2011/audio/audio-eq-cookbook.html
//!
//! Shelf and peaking gain is additive: the signal is filtered to isolate the
//! frequency-selected component and the gain is applied to that component
//! only (`out = in + filtered * (linear_gain - 1)`), leaving the rest of the
//! spectrum untouched.

use crate::error::{invalid_param, CadenzaError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Maximum supported filter order
pub const MAX_ORDER: usize = 8;

/// Normalized biquad coefficients (divided by a0).
///
/// First-order sections set `b2 = a2 = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Cookbook low-pass section with the given Q
    fn lowpass(sample_rate: u32, cutoff_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate as f64;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;

        Self {
            b0: ((1.0 - cos_w0) / 2.0) / a0,
            b1: (1.0 - cos_w0) / a0,
            b2: ((1.0 - cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Cookbook high-pass section with the given Q
    fn highpass(sample_rate: u32, cutoff_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate as f64;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;

        Self {
            b0: ((1.0 + cos_w0) / 2.0) / a0,
            b1: (-(1.0 + cos_w0)) / a0,
            b2: ((1.0 + cos_w0) / 2.0) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Cookbook band-pass section (constant 0 dB peak gain). Used by the
    /// wah-wah sweep, which needs a causal filter it can retune mid-buffer.
    pub(crate) fn bandpass_peak(sample_rate: u32, center_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * center_hz / sample_rate as f64;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;

        Self {
            b0: alpha / a0,
            b1: 0.0,
            b2: -alpha / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// First-order low-pass via bilinear transform
    fn first_order_lowpass(sample_rate: u32, cutoff_hz: f64) -> Self {
        let k = (PI * cutoff_hz / sample_rate as f64).tan();
        Self {
            b0: k / (k + 1.0),
            b1: k / (k + 1.0),
            b2: 0.0,
            a1: (k - 1.0) / (k + 1.0),
            a2: 0.0,
        }
    }

    /// First-order high-pass via bilinear transform
    fn first_order_highpass(sample_rate: u32, cutoff_hz: f64) -> Self {
        let k = (PI * cutoff_hz / sample_rate as f64).tan();
        Self {
            b0: 1.0 / (k + 1.0),
            b1: -1.0 / (k + 1.0),
            b2: 0.0,
            a1: (k - 1.0) / (k + 1.0),
            a2: 0.0,
        }
    }
}

/// Direct Form II transposed state for one section
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    pub(crate) fn process(&mut self, input: f64, c: &Biquad) -> f64 {
        let output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Filter response kind for Butterworth design
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Response {
    Lowpass,
    Highpass,
}

/// Design a Butterworth cascade of the requested order.
///
/// Even orders are all biquads; odd orders add one first-order section. Per
/// pair Q values come from the Butterworth pole angles.
fn butterworth(response: Response, sample_rate: u32, cutoff_hz: f64, order: usize) -> Vec<Biquad> {
    let odd = order % 2 == 1;
    let pairs = order / 2;
    let mut stages = Vec::with_capacity(pairs + usize::from(odd));

    if odd {
        stages.push(match response {
            Response::Lowpass => Biquad::first_order_lowpass(sample_rate, cutoff_hz),
            Response::Highpass => Biquad::first_order_highpass(sample_rate, cutoff_hz),
        });
    }

    for k in 0..pairs {
        let phi = if odd {
            PI * (k as f64 + 1.0) / order as f64
        } else {
            PI * (2.0 * k as f64 + 1.0) / (2.0 * order as f64)
        };
        let q = 1.0 / (2.0 * phi.cos());
        stages.push(match response {
            Response::Lowpass => Biquad::lowpass(sample_rate, cutoff_hz, q),
            Response::Highpass => Biquad::highpass(sample_rate, cutoff_hz, q),
        });
    }

    stages
}

/// Run the cascade forward over the buffer with fresh state
fn apply_cascade(input: &[f32], stages: &[Biquad]) -> Vec<f32> {
    let mut states = vec![BiquadState::default(); stages.len()];
    input
        .iter()
        .map(|&sample| {
            let mut acc = sample as f64;
            for (stage, state) in stages.iter().zip(states.iter_mut()) {
                acc = state.process(acc, stage);
            }
            acc as f32
        })
        .collect()
}

/// Zero-phase application: forward pass, reverse, forward pass again,
/// reverse. Output has the same length and no time shift.
fn filtfilt(input: &[f32], stages: &[Biquad]) -> Vec<f32> {
    let mut forward = apply_cascade(input, stages);
    forward.reverse();
    let mut backward = apply_cascade(&forward, stages);
    backward.reverse();
    backward
}

fn validate_cutoff(cutoff_hz: f32, sample_rate: u32) -> Result<()> {
    let nyquist = sample_rate as f32 / 2.0;
    if cutoff_hz <= 0.0 || cutoff_hz >= nyquist {
        return Err(CadenzaError::CutoffOutOfRange { cutoff_hz, nyquist });
    }
    Ok(())
}

fn validate_order(order: usize) -> Result<()> {
    if order == 0 || order > MAX_ORDER {
        return Err(invalid_param("order", order, format!("1 to {}", MAX_ORDER)));
    }
    Ok(())
}

/// Buffers shorter than the startup history of the cascade pass through
/// unchanged (effects are no-ops on trivial input).
fn too_short(input: &[f32], order: usize) -> bool {
    input.len() <= 3 * 2 * order
}

/// Zero-phase Butterworth low-pass
pub fn lowpass(input: &[f32], sample_rate: u32, cutoff_hz: f32, order: usize) -> Result<Vec<f32>> {
    validate_cutoff(cutoff_hz, sample_rate)?;
    validate_order(order)?;
    if too_short(input, order) {
        return Ok(input.to_vec());
    }
    let stages = butterworth(Response::Lowpass, sample_rate, cutoff_hz as f64, order);
    Ok(filtfilt(input, &stages))
}

/// Zero-phase Butterworth high-pass
pub fn highpass(input: &[f32], sample_rate: u32, cutoff_hz: f32, order: usize) -> Result<Vec<f32>> {
    validate_cutoff(cutoff_hz, sample_rate)?;
    validate_order(order)?;
    if too_short(input, order) {
        return Ok(input.to_vec());
    }
    let stages = butterworth(Response::Highpass, sample_rate, cutoff_hz as f64, order);
    Ok(filtfilt(input, &stages))
}

/// Zero-phase band-pass built as high-pass at `low_hz` cascaded with
/// low-pass at `high_hz`
pub fn bandpass(
    input: &[f32],
    sample_rate: u32,
    low_hz: f32,
    high_hz: f32,
    order: usize,
) -> Result<Vec<f32>> {
    validate_cutoff(low_hz, sample_rate)?;
    validate_cutoff(high_hz, sample_rate)?;
    validate_order(order)?;
    if low_hz >= high_hz {
        return Err(invalid_param(
            "low_hz",
            low_hz,
            format!("below high_hz ({} Hz)", high_hz),
        ));
    }
    if too_short(input, order) {
        return Ok(input.to_vec());
    }

    let mut stages = butterworth(Response::Highpass, sample_rate, low_hz as f64, order);
    stages.extend(butterworth(
        Response::Lowpass,
        sample_rate,
        high_hz as f64,
        order,
    ));
    Ok(filtfilt(input, &stages))
}

/// Order used by the shelf/peaking helpers and the equalizer bands
const SHELF_ORDER: usize = 2;

/// Apply `gain` to the frequency-selected component only
fn additive_gain(input: &[f32], selected: &[f32], gain_db: f32) -> Vec<f32> {
    let gain = 10.0_f32.powf(gain_db / 20.0);
    input
        .iter()
        .zip(selected.iter())
        .map(|(&x, &band)| x + band * (gain - 1.0))
        .collect()
}

/// Low shelf: boost/cut everything below `cutoff_hz` by `gain_db`
pub fn low_shelf(input: &[f32], sample_rate: u32, cutoff_hz: f32, gain_db: f32) -> Result<Vec<f32>> {
    let selected = lowpass(input, sample_rate, cutoff_hz, SHELF_ORDER)?;
    Ok(additive_gain(input, &selected, gain_db))
}

/// High shelf: boost/cut everything above `cutoff_hz` by `gain_db`
pub fn high_shelf(
    input: &[f32],
    sample_rate: u32,
    cutoff_hz: f32,
    gain_db: f32,
) -> Result<Vec<f32>> {
    let selected = highpass(input, sample_rate, cutoff_hz, SHELF_ORDER)?;
    Ok(additive_gain(input, &selected, gain_db))
}

/// Peaking band: boost/cut a band of width `center_hz / q` around
/// `center_hz` by `gain_db`
pub fn peaking(
    input: &[f32],
    sample_rate: u32,
    center_hz: f32,
    gain_db: f32,
    q: f32,
) -> Result<Vec<f32>> {
    validate_cutoff(center_hz, sample_rate)?;
    if q < 0.1 || q > 10.0 {
        return Err(invalid_param("q", q, "0.1 to 10.0"));
    }

    let nyquist = sample_rate as f32 / 2.0;
    let bandwidth = center_hz / q;
    let low = (center_hz - bandwidth / 2.0).max(1.0);
    let high = (center_hz + bandwidth / 2.0).min(nyquist - 1.0);

    let selected = bandpass(input, sample_rate, low, high, SHELF_ORDER)?;
    Ok(additive_gain(input, &selected, gain_db))
}

fn default_low_freq() -> f32 {
    100.0
}
fn default_mid_freq() -> f32 {
    1000.0
}
fn default_mid_q() -> f32 {
    1.0
}
fn default_high_freq() -> f32 {
    5000.0
}

/// 3-band equalizer parameters: low shelf, mid peak, high shelf
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EqualizerParams {
    /// Low shelf corner frequency in Hz
    #[serde(default = "default_low_freq")]
    pub low_freq: f32,
    /// Low shelf gain in dB (-24 to +24)
    #[serde(default)]
    pub low_gain_db: f32,
    /// Mid peak center frequency in Hz
    #[serde(default = "default_mid_freq")]
    pub mid_freq: f32,
    /// Mid peak gain in dB (-24 to +24)
    #[serde(default)]
    pub mid_gain_db: f32,
    /// Mid peak Q (0.1 to 10.0)
    #[serde(default = "default_mid_q")]
    pub mid_q: f32,
    /// High shelf corner frequency in Hz
    #[serde(default = "default_high_freq")]
    pub high_freq: f32,
    /// High shelf gain in dB (-24 to +24)
    #[serde(default)]
    pub high_gain_db: f32,
}

impl Default for EqualizerParams {
    fn default() -> Self {
        Self {
            low_freq: default_low_freq(),
            low_gain_db: 0.0,
            mid_freq: default_mid_freq(),
            mid_gain_db: 0.0,
            mid_q: default_mid_q(),
            high_freq: default_high_freq(),
            high_gain_db: 0.0,
        }
    }
}

impl EqualizerParams {
    /// Validate all band parameters against the engine's Nyquist limit
    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        validate_cutoff(self.low_freq, sample_rate)?;
        validate_cutoff(self.mid_freq, sample_rate)?;
        validate_cutoff(self.high_freq, sample_rate)?;

        for (name, gain) in [
            ("low_gain_db", self.low_gain_db),
            ("mid_gain_db", self.mid_gain_db),
            ("high_gain_db", self.high_gain_db),
        ] {
            if !(-24.0..=24.0).contains(&gain) {
                return Err(invalid_param(name, gain, "-24 to +24 dB"));
            }
        }
        if self.mid_q < 0.1 || self.mid_q > 10.0 {
            return Err(invalid_param("mid_q", self.mid_q, "0.1 to 10.0"));
        }
        Ok(())
    }
}

/// 3-band equalizer: low shelf, mid peaking band, high shelf in series
pub fn equalizer(input: &[f32], sample_rate: u32, params: &EqualizerParams) -> Result<Vec<f32>> {
    params.validate(sample_rate)?;

    let out = low_shelf(input, sample_rate, params.low_freq, params.low_gain_db)?;
    let out = peaking(
        &out,
        sample_rate,
        params.mid_freq,
        params.mid_gain_db,
        params.mid_q,
    )?;
    high_shelf(&out, sample_rate, params.high_freq, params.high_gain_db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    const SR: u32 = 44100;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_lowpass_passes_low_blocks_high() {
        let low = sine(100.0, 8192);
        let high = sine(8000.0, 8192);

        let low_out = lowpass(&low, SR, 1000.0, 4).unwrap();
        let high_out = lowpass(&high, SR, 1000.0, 4).unwrap();

        let low_ratio = rms(&low_out) / rms(&low);
        let high_ratio = rms(&high_out) / rms(&high);

        assert!(low_ratio > 0.9, "passband attenuated: {}", low_ratio);
        assert!(high_ratio < 0.05, "stopband leaked: {}", high_ratio);
    }

    #[test]
    fn test_highpass_passes_high_blocks_low() {
        let low = sine(100.0, 8192);
        let high = sine(8000.0, 8192);

        let low_out = highpass(&low, SR, 1000.0, 4).unwrap();
        let high_out = highpass(&high, SR, 1000.0, 4).unwrap();

        assert!(rms(&low_out) / rms(&low) < 0.05);
        assert!(rms(&high_out) / rms(&high) > 0.9);
    }

    #[test]
    fn test_bandpass_selects_band() {
        let below = sine(100.0, 8192);
        let inside = sine(1000.0, 8192);
        let above = sine(10000.0, 8192);

        let below_out = bandpass(&below, SR, 500.0, 2000.0, 4).unwrap();
        let inside_out = bandpass(&inside, SR, 500.0, 2000.0, 4).unwrap();
        let above_out = bandpass(&above, SR, 500.0, 2000.0, 4).unwrap();

        assert!(rms(&inside_out) / rms(&inside) > 0.85);
        assert!(rms(&below_out) / rms(&below) < 0.1);
        assert!(rms(&above_out) / rms(&above) < 0.1);
    }

    #[test]
    fn test_zero_phase_no_time_shift() {
        // A zero-phase filter leaves a passband sine aligned with the input
        let input = sine(200.0, 8192);
        let output = lowpass(&input, SR, 4000.0, 4).unwrap();

        assert_eq!(output.len(), input.len());
        // Compare away from the edges where startup transients live
        for i in 2000..6000 {
            assert_abs_diff_eq!(output[i], input[i], epsilon = 0.05);
        }
    }

    #[test_case(0.0; "zero cutoff")]
    #[test_case(-50.0; "negative cutoff")]
    #[test_case(22050.0; "at nyquist")]
    #[test_case(30000.0; "above nyquist")]
    fn test_invalid_cutoff_rejected(cutoff: f32) {
        let input = sine(440.0, 1024);
        assert!(lowpass(&input, SR, cutoff, 2).is_err());
        assert!(highpass(&input, SR, cutoff, 2).is_err());
    }

    #[test]
    fn test_invalid_order_rejected() {
        let input = sine(440.0, 1024);
        assert!(lowpass(&input, SR, 1000.0, 0).is_err());
        assert!(lowpass(&input, SR, 1000.0, MAX_ORDER + 1).is_err());
    }

    #[test]
    fn test_bandpass_rejects_inverted_band() {
        let input = sine(440.0, 1024);
        assert!(bandpass(&input, SR, 2000.0, 500.0, 2).is_err());
    }

    #[test]
    fn test_short_buffer_passthrough() {
        let input = vec![0.1, -0.2, 0.3];
        let output = lowpass(&input, SR, 1000.0, 4).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_empty_buffer_passthrough() {
        let output = highpass(&[], SR, 1000.0, 2).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_low_shelf_boosts_low_leaves_high() {
        let low = sine(100.0, 8192);
        let high = sine(8000.0, 8192);

        let low_out = low_shelf(&low, SR, 500.0, 12.0).unwrap();
        let high_out = low_shelf(&high, SR, 500.0, 12.0).unwrap();

        // 12 dB is ~4x linear
        let low_ratio = rms(&low_out) / rms(&low);
        assert!(
            low_ratio > 3.0 && low_ratio < 5.0,
            "expected ~4x, got {}",
            low_ratio
        );
        let high_ratio = rms(&high_out) / rms(&high);
        assert!(
            (high_ratio - 1.0).abs() < 0.1,
            "high band should be untouched, got {}",
            high_ratio
        );
    }

    #[test]
    fn test_high_shelf_cut() {
        let high = sine(10000.0, 8192);
        let out = high_shelf(&high, SR, 3000.0, -12.0).unwrap();
        let ratio = rms(&out) / rms(&high);
        assert!(
            ratio > 0.2 && ratio < 0.35,
            "expected ~0.25x, got {}",
            ratio
        );
    }

    #[test]
    fn test_peaking_boost_at_center() {
        let center = sine(1000.0, 8192);
        let far = sine(100.0, 8192);

        let center_out = peaking(&center, SR, 1000.0, 12.0, 1.0).unwrap();
        let far_out = peaking(&far, SR, 1000.0, 12.0, 1.0).unwrap();

        assert!(rms(&center_out) / rms(&center) > 2.5);
        assert!((rms(&far_out) / rms(&far) - 1.0).abs() < 0.15);
    }

    #[test]
    fn test_zero_gain_shelf_is_identity() {
        let input = sine(440.0, 4096);
        let output = low_shelf(&input, SR, 500.0, 0.0).unwrap();
        // gain - 1 == 0 means nothing is added back
        assert_eq!(output, input);
    }

    #[test]
    fn test_equalizer_default_is_identity() {
        let input = sine(440.0, 4096);
        let output = equalizer(&input, SR, &EqualizerParams::default()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_equalizer_validates_params() {
        let input = sine(440.0, 4096);
        let params = EqualizerParams {
            mid_gain_db: 48.0,
            ..Default::default()
        };
        assert!(equalizer(&input, SR, &params).is_err());
    }

    #[test]
    fn test_equalizer_shapes_spectrum() {
        let low = sine(80.0, 8192);
        let params = EqualizerParams {
            low_gain_db: 6.0,
            ..Default::default()
        };
        let out = equalizer(&low, SR, &params).unwrap();
        let ratio = rms(&out) / rms(&low);
        assert!(ratio > 1.6 && ratio < 2.4, "expected ~2x, got {}", ratio);
    }
}
