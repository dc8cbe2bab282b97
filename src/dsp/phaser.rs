//! Phaser
//!
//! Six first-order all-pass stages centered at staggered base frequencies,
//! each swept by an LFO with a per-stage phase offset so the notches move
//! independently. Feedback around the stage chain raises the resonance of
//! the swept comb. Coefficients are recomputed every sample from the
//! modulated center frequency.

use super::lfo::{Lfo, Waveform};
use crate::error::{invalid_param, Result};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Per-stage base center frequencies in Hz
const STAGE_CENTERS_HZ: [f32; 6] = [200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0];

fn default_rate_hz() -> f32 {
    0.5
}
fn default_depth() -> f32 {
    0.7
}
fn default_feedback() -> f32 {
    0.5
}

/// Phaser parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaserParams {
    /// LFO sweep rate in Hz (0.05 to 10)
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f32,
    /// Sweep depth (0 to 1); 1 sweeps each stage one octave around its center
    #[serde(default = "default_depth")]
    pub depth: f32,
    /// Feedback around the stage chain (0 to 0.9)
    #[serde(default = "default_feedback")]
    pub feedback: f32,
}

impl Default for PhaserParams {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            depth: default_depth(),
            feedback: default_feedback(),
        }
    }
}

impl PhaserParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.05..=10.0).contains(&self.rate_hz) {
            return Err(invalid_param("rate_hz", self.rate_hz, "0.05 to 10 Hz"));
        }
        if !(0.0..=1.0).contains(&self.depth) {
            return Err(invalid_param("depth", self.depth, "0 to 1"));
        }
        if !(0.0..=0.9).contains(&self.feedback) {
            return Err(invalid_param("feedback", self.feedback, "0 to 0.9"));
        }
        Ok(())
    }
}

/// First-order all-pass with a per-sample coefficient
#[derive(Debug, Clone, Default)]
struct AllpassStage {
    x1: f32,
    y1: f32,
}

impl AllpassStage {
    fn process(&mut self, input: f32, coeff: f32) -> f32 {
        let output = coeff * input + self.x1 - coeff * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }
}

/// Swept-notch phaser
pub fn phaser(input: &[f32], sample_rate: u32, params: &PhaserParams) -> Result<Vec<f32>> {
    params.validate()?;
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let stages = STAGE_CENTERS_HZ.len();
    let nyquist = sample_rate as f32 / 2.0;

    // Staggered LFOs: stage k starts at phase offset k * pi / N
    let mut lfos: Vec<Lfo> = (0..stages)
        .map(|k| {
            Lfo::new(params.rate_hz, sample_rate, Waveform::Sine)
                .with_phase(k as f32 * PI / stages as f32 / (2.0 * PI))
        })
        .collect();

    let mut states = vec![AllpassStage::default(); stages];
    let mut last_output = 0.0f32;

    let output = input
        .iter()
        .map(|&x| {
            let mut acc = x + params.feedback * last_output;

            for (k, (lfo, state)) in lfos.iter_mut().zip(states.iter_mut()).enumerate() {
                // Sweep up to one octave around the stage center
                let center = STAGE_CENTERS_HZ[k] * 2.0_f32.powf(params.depth * lfo.next() * 0.5);
                let center = center.clamp(20.0, nyquist * 0.95);

                let tan_half = (PI * center / sample_rate as f32).tan();
                let coeff = (tan_half - 1.0) / (tan_half + 1.0);
                acc = state.process(acc, coeff);
            }

            last_output = acc;
            0.5 * (x + acc)
        })
        .collect();
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_param_validation() {
        let mut params = PhaserParams::default();
        assert!(params.validate().is_ok());

        params.rate_hz = 0.0;
        assert!(params.validate().is_err());
        params.rate_hz = 0.5;

        params.feedback = 0.99;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_output_length_and_boundedness() {
        let input = sine(440.0, 22050);
        let output = phaser(&input, SR, &PhaserParams::default()).unwrap();

        assert_eq!(output.len(), input.len());
        assert!(output.iter().all(|s| s.is_finite()));
        // Resonance may lift peaks but the result stays in a sane range
        assert!(rms(&output) < 4.0 * rms(&input));
    }

    #[test]
    fn test_colors_the_signal() {
        // The swept notches must actually change the waveform
        let input = sine(800.0, 22050);
        let output = phaser(&input, SR, &PhaserParams::default()).unwrap();

        let max_diff = input
            .iter()
            .zip(output.iter())
            .fold(0.0f32, |acc, (a, b)| acc.max((a - b).abs()));
        assert!(max_diff > 0.05, "phaser left the signal unchanged");
    }

    #[test]
    fn test_amplitude_varies_over_time() {
        // As the notch sweeps through the tone, short-window level changes
        let input = sine(800.0, SR as usize * 2);
        let params = PhaserParams {
            rate_hz: 1.0,
            depth: 1.0,
            feedback: 0.3,
        };
        let output = phaser(&input, SR, &params).unwrap();

        let window = 2205;
        let levels: Vec<f32> = output.chunks(window).map(rms).collect();
        let min = levels.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = levels.iter().cloned().fold(0.0f32, f32::max);
        assert!(
            max / min.max(1e-9) > 1.05,
            "no audible sweep: min {} max {}",
            min,
            max
        );
    }

    #[test]
    fn test_silence_in_silence_out() {
        let input = vec![0.0; 8192];
        let output = phaser(&input, SR, &PhaserParams::default()).unwrap();
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_empty_input() {
        let output = phaser(&[], SR, &PhaserParams::default()).unwrap();
        assert!(output.is_empty());
    }
}
