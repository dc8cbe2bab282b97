//! Modulation effects: chorus, flanger, tremolo, vibrato, wah-wah
//!
//! Chorus and flanger share a multi-voice modulated delay core and differ
//! only in their delay ranges and feedback. Tremolo modulates amplitude,
//! vibrato modulates pitch over overlapped windows, and the wah-wah sweeps
//! a band-pass filter retuned in short chunks.

use super::delay_line::DelayLine;
use super::filter::{Biquad, BiquadState};
use super::lfo::{Lfo, Waveform};
use super::pitch::resample_linear;
use crate::error::{invalid_param, Result};
use serde::{Deserialize, Serialize};

/// Per-voice detuning for the modulated delay core. Slightly different
/// rates, base delays, and depths keep the voices from phase-locking.
const VOICE_RATE_MUL: [f32; 3] = [1.0, 1.13, 0.91];
const VOICE_DELAY_MUL: [f32; 3] = [1.0, 1.19, 0.86];
const VOICE_DEPTH_MUL: [f32; 3] = [1.0, 1.07, 0.94];
const VOICE_PHASE: [f32; 3] = [0.0, 0.33, 0.67];

/// Overlap-add window length for vibrato
const VIBRATO_WINDOW: usize = 1024;
const VIBRATO_HOP: usize = VIBRATO_WINDOW / 2;

/// Coefficient update interval for the wah-wah sweep, in samples
const WAH_CHUNK: usize = 256;
const WAH_Q: f64 = 2.0;

fn default_chorus_rate() -> f32 {
    1.5
}
fn default_chorus_delay() -> f32 {
    0.02
}
fn default_chorus_depth() -> f32 {
    0.005
}
fn default_flanger_rate() -> f32 {
    0.25
}
fn default_flanger_delay() -> f32 {
    0.003
}
fn default_flanger_depth() -> f32 {
    0.002
}
fn default_flanger_feedback() -> f32 {
    0.5
}
fn default_wet() -> f32 {
    0.5
}
fn default_flanger_wet() -> f32 {
    0.7
}
fn default_dry() -> f32 {
    1.0
}
fn default_tremolo_rate() -> f32 {
    5.0
}
fn default_tremolo_depth() -> f32 {
    0.5
}
fn default_vibrato_rate() -> f32 {
    5.0
}
fn default_vibrato_depth() -> f32 {
    0.5
}
fn default_wah_rate() -> f32 {
    2.0
}
fn default_wah_min() -> f32 {
    300.0
}
fn default_wah_max() -> f32 {
    2000.0
}

/// Chorus parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChorusParams {
    /// Modulation rate in Hz (0.05 to 10)
    #[serde(default = "default_chorus_rate")]
    pub rate_hz: f32,
    /// Center delay in seconds (0.005 to 0.05)
    #[serde(default = "default_chorus_delay")]
    pub base_delay_s: f32,
    /// Modulation depth in seconds, must not exceed the center delay
    #[serde(default = "default_chorus_depth")]
    pub depth_s: f32,
    /// Wet level (0 to 1)
    #[serde(default = "default_wet")]
    pub wet: f32,
    /// Dry level (0 to 1)
    #[serde(default = "default_dry")]
    pub dry: f32,
}

impl Default for ChorusParams {
    fn default() -> Self {
        Self {
            rate_hz: default_chorus_rate(),
            base_delay_s: default_chorus_delay(),
            depth_s: default_chorus_depth(),
            wet: default_wet(),
            dry: default_dry(),
        }
    }
}

impl ChorusParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.05..=10.0).contains(&self.rate_hz) {
            return Err(invalid_param("rate_hz", self.rate_hz, "0.05 to 10 Hz"));
        }
        if !(0.005..=0.05).contains(&self.base_delay_s) {
            return Err(invalid_param(
                "base_delay_s",
                self.base_delay_s,
                "0.005 to 0.05 s",
            ));
        }
        if self.depth_s <= 0.0 || self.depth_s > self.base_delay_s {
            return Err(invalid_param(
                "depth_s",
                self.depth_s,
                "positive and at most base_delay_s",
            ));
        }
        if !(0.0..=1.0).contains(&self.wet) {
            return Err(invalid_param("wet", self.wet, "0.0 to 1.0"));
        }
        if !(0.0..=1.0).contains(&self.dry) {
            return Err(invalid_param("dry", self.dry, "0.0 to 1.0"));
        }
        Ok(())
    }
}

/// Flanger parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlangerParams {
    /// Modulation rate in Hz (0.05 to 10)
    #[serde(default = "default_flanger_rate")]
    pub rate_hz: f32,
    /// Center delay in seconds (0.0005 to 0.01)
    #[serde(default = "default_flanger_delay")]
    pub base_delay_s: f32,
    /// Modulation depth in seconds, must not exceed the center delay
    #[serde(default = "default_flanger_depth")]
    pub depth_s: f32,
    /// Regeneration into the delay line (0 to 0.9)
    #[serde(default = "default_flanger_feedback")]
    pub feedback: f32,
    /// Wet level (0 to 1)
    #[serde(default = "default_flanger_wet")]
    pub wet: f32,
    /// Dry level (0 to 1)
    #[serde(default = "default_dry")]
    pub dry: f32,
}

impl Default for FlangerParams {
    fn default() -> Self {
        Self {
            rate_hz: default_flanger_rate(),
            base_delay_s: default_flanger_delay(),
            depth_s: default_flanger_depth(),
            feedback: default_flanger_feedback(),
            wet: default_flanger_wet(),
            dry: default_dry(),
        }
    }
}

impl FlangerParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.05..=10.0).contains(&self.rate_hz) {
            return Err(invalid_param("rate_hz", self.rate_hz, "0.05 to 10 Hz"));
        }
        if !(0.0005..=0.01).contains(&self.base_delay_s) {
            return Err(invalid_param(
                "base_delay_s",
                self.base_delay_s,
                "0.0005 to 0.01 s",
            ));
        }
        if self.depth_s <= 0.0 || self.depth_s > self.base_delay_s {
            return Err(invalid_param(
                "depth_s",
                self.depth_s,
                "positive and at most base_delay_s",
            ));
        }
        if !(0.0..=0.9).contains(&self.feedback) {
            return Err(invalid_param("feedback", self.feedback, "0.0 to 0.9"));
        }
        if !(0.0..=1.0).contains(&self.wet) {
            return Err(invalid_param("wet", self.wet, "0.0 to 1.0"));
        }
        if !(0.0..=1.0).contains(&self.dry) {
            return Err(invalid_param("dry", self.dry, "0.0 to 1.0"));
        }
        Ok(())
    }
}

/// Tremolo parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TremoloParams {
    /// Modulation rate in Hz (0.1 to 20)
    #[serde(default = "default_tremolo_rate")]
    pub rate_hz: f32,
    /// Modulation depth (0 = no effect, 1 = full amplitude swing)
    #[serde(default = "default_tremolo_depth")]
    pub depth: f32,
    /// Modulator shape
    #[serde(default)]
    pub waveform: Waveform,
}

impl Default for TremoloParams {
    fn default() -> Self {
        Self {
            rate_hz: default_tremolo_rate(),
            depth: default_tremolo_depth(),
            waveform: Waveform::default(),
        }
    }
}

impl TremoloParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.1..=20.0).contains(&self.rate_hz) {
            return Err(invalid_param("rate_hz", self.rate_hz, "0.1 to 20 Hz"));
        }
        if !(0.0..=1.0).contains(&self.depth) {
            return Err(invalid_param("depth", self.depth, "0.0 to 1.0"));
        }
        Ok(())
    }
}

/// Vibrato parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VibratoParams {
    /// Modulation rate in Hz (0.1 to 14)
    #[serde(default = "default_vibrato_rate")]
    pub rate_hz: f32,
    /// Peak pitch deviation in semitones (0 to 2)
    #[serde(default = "default_vibrato_depth")]
    pub depth_semitones: f32,
}

impl Default for VibratoParams {
    fn default() -> Self {
        Self {
            rate_hz: default_vibrato_rate(),
            depth_semitones: default_vibrato_depth(),
        }
    }
}

impl VibratoParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.1..=14.0).contains(&self.rate_hz) {
            return Err(invalid_param("rate_hz", self.rate_hz, "0.1 to 14 Hz"));
        }
        if !(0.0..=2.0).contains(&self.depth_semitones) {
            return Err(invalid_param(
                "depth_semitones",
                self.depth_semitones,
                "0 to 2 semitones",
            ));
        }
        Ok(())
    }
}

/// Wah-wah parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WahWahParams {
    /// Sweep rate in Hz (0.05 to 20)
    #[serde(default = "default_wah_rate")]
    pub rate_hz: f32,
    /// Lower bound of the sweep in Hz
    #[serde(default = "default_wah_min")]
    pub min_freq_hz: f32,
    /// Upper bound of the sweep in Hz
    #[serde(default = "default_wah_max")]
    pub max_freq_hz: f32,
}

impl Default for WahWahParams {
    fn default() -> Self {
        Self {
            rate_hz: default_wah_rate(),
            min_freq_hz: default_wah_min(),
            max_freq_hz: default_wah_max(),
        }
    }
}

impl WahWahParams {
    /// Validate parameters against their documented ranges and the
    /// sample rate's Nyquist limit
    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        if !(0.05..=20.0).contains(&self.rate_hz) {
            return Err(invalid_param("rate_hz", self.rate_hz, "0.05 to 20 Hz"));
        }
        if self.min_freq_hz <= 0.0 {
            return Err(invalid_param("min_freq_hz", self.min_freq_hz, "above 0 Hz"));
        }
        let nyquist = sample_rate as f32 / 2.0;
        if self.max_freq_hz <= self.min_freq_hz || self.max_freq_hz >= nyquist {
            return Err(invalid_param(
                "max_freq_hz",
                self.max_freq_hz,
                format!("above min_freq_hz and below Nyquist ({nyquist} Hz)"),
            ));
        }
        Ok(())
    }
}

/// One modulated-delay voice: a delay line whose read tap wanders around
/// a center delay under LFO control.
struct Voice {
    line: DelayLine,
    lfo: Lfo,
    center: f32,
    depth: f32,
}

impl Voice {
    fn new(index: usize, rate_hz: f32, base_delay_s: f32, depth_s: f32, sample_rate: u32) -> Self {
        let center = base_delay_s * VOICE_DELAY_MUL[index] * sample_rate as f32;
        let depth = depth_s * VOICE_DEPTH_MUL[index] * sample_rate as f32;
        let capacity = (center + depth).ceil() as usize + 2;

        Self {
            line: DelayLine::new(capacity),
            lfo: Lfo::new(rate_hz * VOICE_RATE_MUL[index], sample_rate, Waveform::Sine)
                .with_phase(VOICE_PHASE[index]),
            center,
            depth,
        }
    }

    fn process(&mut self, input: f32, feedback: f32) -> f32 {
        let offset = (self.center + self.depth * self.lfo.next()).max(1.0);
        let tap = self.line.read_fractional(offset);
        self.line.write_and_advance(input + feedback * tap);
        tap
    }
}

fn modulated_delay(
    input: &[f32],
    sample_rate: u32,
    rate_hz: f32,
    base_delay_s: f32,
    depth_s: f32,
    feedback: f32,
    wet: f32,
    dry: f32,
) -> Vec<f32> {
    let mut voices: Vec<Voice> = (0..VOICE_RATE_MUL.len())
        .map(|i| Voice::new(i, rate_hz, base_delay_s, depth_s, sample_rate))
        .collect();
    let scale = 1.0 / voices.len() as f32;

    input
        .iter()
        .map(|&x| {
            let blend: f32 = voices.iter_mut().map(|v| v.process(x, feedback)).sum();
            dry * x + wet * blend * scale
        })
        .collect()
}

/// Thicken the signal with three detuned delay voices.
pub fn chorus(input: &[f32], sample_rate: u32, params: &ChorusParams) -> Result<Vec<f32>> {
    params.validate()?;
    Ok(modulated_delay(
        input,
        sample_rate,
        params.rate_hz,
        params.base_delay_s,
        params.depth_s,
        0.0,
        params.wet,
        params.dry,
    ))
}

/// Sweeping comb-filter effect from a short regenerated delay.
pub fn flanger(input: &[f32], sample_rate: u32, params: &FlangerParams) -> Result<Vec<f32>> {
    params.validate()?;
    Ok(modulated_delay(
        input,
        sample_rate,
        params.rate_hz,
        params.base_delay_s,
        params.depth_s,
        params.feedback,
        params.wet,
        params.dry,
    ))
}

/// Periodic amplitude modulation. At full depth the gain reaches zero at
/// the trough of each cycle; at zero depth the signal is unchanged.
pub fn tremolo(input: &[f32], sample_rate: u32, params: &TremoloParams) -> Result<Vec<f32>> {
    params.validate()?;

    let mut lfo = Lfo::new(params.rate_hz, sample_rate, params.waveform);
    Ok(input
        .iter()
        .map(|&x| {
            let unipolar = (lfo.next() + 1.0) / 2.0;
            x * (1.0 - params.depth * (1.0 - unipolar))
        })
        .collect())
}

/// Periodic pitch modulation via overlapped, resampled windows.
///
/// Each Hann-windowed segment is resampled by the pitch ratio the LFO
/// dictates at the segment's center, then overlap-added at 50% hop.
pub fn vibrato(input: &[f32], sample_rate: u32, params: &VibratoParams) -> Result<Vec<f32>> {
    params.validate()?;

    if input.len() < VIBRATO_WINDOW || params.depth_semitones == 0.0 {
        return Ok(input.to_vec());
    }

    let window: Vec<f32> = (0..VIBRATO_WINDOW)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / VIBRATO_WINDOW as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect();

    let mut output = vec![0.0f32; input.len()];
    let mut weight = vec![0.0f32; input.len()];

    let mut start = 0;
    while start + VIBRATO_WINDOW <= input.len() {
        let center = (start + VIBRATO_WINDOW / 2) as f32 / sample_rate as f32;
        let lfo_value = (2.0 * std::f32::consts::PI * params.rate_hz * center).sin();
        let semitones = params.depth_semitones * lfo_value;
        let ratio = 2.0f32.powf(semitones / 12.0);

        let segment = &input[start..start + VIBRATO_WINDOW];
        let shifted = resample_linear(segment, ratio);

        for i in 0..VIBRATO_WINDOW {
            let sample = shifted.get(i).copied().unwrap_or(0.0);
            output[start + i] += window[i] * sample;
            weight[start + i] += window[i];
        }
        start += VIBRATO_HOP;
    }

    // Undercovered edges (first/last half window, or a short tail that no
    // full window reaches) fall back to the dry signal.
    for i in 0..input.len() {
        if weight[i] > 1e-6 {
            output[i] /= weight[i];
        } else {
            output[i] = input[i];
        }
    }

    Ok(output)
}

/// Sweep a band-pass filter across the signal under LFO control.
///
/// The filter is retuned once per chunk to the LFO's average position over
/// that chunk; filter state carries across retunes so the sweep stays
/// click-free.
pub fn wah_wah(input: &[f32], sample_rate: u32, params: &WahWahParams) -> Result<Vec<f32>> {
    params.validate(sample_rate)?;

    let mut lfo = Lfo::new(params.rate_hz, sample_rate, Waveform::Sine);
    let mut state = BiquadState::default();
    let span = params.max_freq_hz - params.min_freq_hz;

    let mut output = Vec::with_capacity(input.len());
    for chunk in input.chunks(WAH_CHUNK) {
        let mean: f32 = chunk.iter().map(|_| lfo.next()).sum::<f32>() / chunk.len() as f32;
        let center = params.min_freq_hz + span * (mean + 1.0) / 2.0;
        let coeffs = Biquad::bandpass_peak(sample_rate, center as f64, WAH_Q);

        for &x in chunk {
            output.push(state.process(x as f64, &coeffs) as f32);
        }
    }

    Ok(output)
}
