//! Feedback delay
//!
//! Ring-buffer echo with a damped feedback path: the fed-back signal passes
//! through a one-pole low-pass at `high_cut_hz` to emulate tape/analog
//! damping. Without that filter the repeats sound metallic.

use super::delay_line::DelayLine;
use crate::error::{invalid_param, Result};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

fn default_time_s() -> f32 {
    0.3
}
fn default_feedback() -> f32 {
    0.4
}
fn default_wet() -> f32 {
    0.5
}
fn default_dry() -> f32 {
    1.0
}
fn default_high_cut_hz() -> f32 {
    5000.0
}

/// Delay parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayParams {
    /// Delay time in seconds (must be positive, up to 5 s)
    #[serde(default = "default_time_s")]
    pub time_s: f32,
    /// Feedback amount (0 to 0.95)
    #[serde(default = "default_feedback")]
    pub feedback: f32,
    /// Wet (delayed) mix level (0 to 1)
    #[serde(default = "default_wet")]
    pub wet: f32,
    /// Dry (input) mix level (0 to 1)
    #[serde(default = "default_dry")]
    pub dry: f32,
    /// Low-pass cutoff applied to the feedback path, in Hz
    #[serde(default = "default_high_cut_hz")]
    pub high_cut_hz: f32,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            time_s: default_time_s(),
            feedback: default_feedback(),
            wet: default_wet(),
            dry: default_dry(),
            high_cut_hz: default_high_cut_hz(),
        }
    }
}

impl DelayParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        if self.time_s <= 0.0 || self.time_s > 5.0 {
            return Err(invalid_param("time_s", self.time_s, "0 (exclusive) to 5 s"));
        }
        if !(0.0..=0.95).contains(&self.feedback) {
            return Err(invalid_param("feedback", self.feedback, "0 to 0.95"));
        }
        if !(0.0..=1.0).contains(&self.wet) {
            return Err(invalid_param("wet", self.wet, "0 to 1"));
        }
        if !(0.0..=1.0).contains(&self.dry) {
            return Err(invalid_param("dry", self.dry, "0 to 1"));
        }
        let nyquist = sample_rate as f32 / 2.0;
        if self.high_cut_hz <= 0.0 || self.high_cut_hz >= nyquist {
            return Err(invalid_param(
                "high_cut_hz",
                self.high_cut_hz,
                format!("0 (exclusive) to {} Hz", nyquist),
            ));
        }
        Ok(())
    }
}

/// One-pole low-pass used in the feedback path
#[derive(Debug, Clone)]
struct FeedbackDamper {
    coeff: f32,
    state: f32,
}

impl FeedbackDamper {
    fn new(cutoff_hz: f32, sample_rate: u32) -> Self {
        Self {
            coeff: (-TAU * cutoff_hz / sample_rate as f32).exp(),
            state: 0.0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        self.state = (1.0 - self.coeff) * input + self.coeff * self.state;
        self.state
    }
}

/// Feedback delay with damped repeats
pub fn delay(input: &[f32], sample_rate: u32, params: &DelayParams) -> Result<Vec<f32>> {
    params.validate(sample_rate)?;

    let delay_samples = (params.time_s * sample_rate as f32).round() as usize;
    if input.is_empty() || delay_samples == 0 {
        return Ok(input.to_vec());
    }

    let mut line = DelayLine::new(delay_samples);
    let mut damper = FeedbackDamper::new(params.high_cut_hz, sample_rate);

    let output = input
        .iter()
        .map(|&x| {
            let delayed = line.read();
            let out = params.dry * x + params.wet * delayed;
            line.write_and_advance(x + params.feedback * damper.process(delayed));
            out
        })
        .collect();
    Ok(output)
}
