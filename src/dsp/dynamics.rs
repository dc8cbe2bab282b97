//! Dynamics processors: compressor and limiter
//!
//! Both are built on the attack/release envelope follower. The compressor
//! computes a desired gain from the ratio (soft knee blends the effective
//! ratio across a band above threshold); the limiter is the hard-brickwall
//! special case with instantaneous gain reduction.

use super::envelope::EnvelopeFollower;
use crate::error::{invalid_param, Result};
use serde::{Deserialize, Serialize};

/// Guard against division by near-zero levels
const EPSILON: f32 = 1e-10;

fn default_threshold_db() -> f32 {
    -20.0
}
fn default_ratio() -> f32 {
    4.0
}
fn default_attack_s() -> f32 {
    0.01
}
fn default_release_s() -> f32 {
    0.1
}
fn default_knee_db() -> f32 {
    2.0
}

/// Compressor parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressorParams {
    /// Threshold level in dB (-60 to 0)
    #[serde(default = "default_threshold_db")]
    pub threshold_db: f32,
    /// Compression ratio (1.0 to 20.0)
    #[serde(default = "default_ratio")]
    pub ratio: f32,
    /// Attack time in seconds (0 to 1)
    #[serde(default = "default_attack_s")]
    pub attack_s: f32,
    /// Release time in seconds (0 to 5)
    #[serde(default = "default_release_s")]
    pub release_s: f32,
    /// Soft knee width in dB (0 = hard knee, up to 12)
    #[serde(default = "default_knee_db")]
    pub knee_db: f32,
    /// Makeup gain in dB (0 to 24)
    #[serde(default)]
    pub makeup_gain_db: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: default_threshold_db(),
            ratio: default_ratio(),
            attack_s: default_attack_s(),
            release_s: default_release_s(),
            knee_db: default_knee_db(),
            makeup_gain_db: 0.0,
        }
    }
}

impl CompressorParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(-60.0..=0.0).contains(&self.threshold_db) {
            return Err(invalid_param(
                "threshold_db",
                self.threshold_db,
                "-60 to 0 dB",
            ));
        }
        if !(1.0..=20.0).contains(&self.ratio) {
            return Err(invalid_param("ratio", self.ratio, "1.0 to 20.0"));
        }
        if !(0.0..=1.0).contains(&self.attack_s) {
            return Err(invalid_param("attack_s", self.attack_s, "0 to 1 s"));
        }
        if !(0.0..=5.0).contains(&self.release_s) {
            return Err(invalid_param("release_s", self.release_s, "0 to 5 s"));
        }
        if !(0.0..=12.0).contains(&self.knee_db) {
            return Err(invalid_param("knee_db", self.knee_db, "0 to 12 dB"));
        }
        if !(0.0..=24.0).contains(&self.makeup_gain_db) {
            return Err(invalid_param(
                "makeup_gain_db",
                self.makeup_gain_db,
                "0 to 24 dB",
            ));
        }
        Ok(())
    }
}

/// Limiter parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterParams {
    /// Ceiling in dB (-60 to 0)
    #[serde(default = "default_limiter_threshold")]
    pub threshold_db: f32,
    /// Release time in seconds (0 to 5)
    #[serde(default = "default_release_s")]
    pub release_s: f32,
}

fn default_limiter_threshold() -> f32 {
    -6.0
}

impl Default for LimiterParams {
    fn default() -> Self {
        Self {
            threshold_db: default_limiter_threshold(),
            release_s: default_release_s(),
        }
    }
}

impl LimiterParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(-60.0..=0.0).contains(&self.threshold_db) {
            return Err(invalid_param(
                "threshold_db",
                self.threshold_db,
                "-60 to 0 dB",
            ));
        }
        if !(0.0..=5.0).contains(&self.release_s) {
            return Err(invalid_param("release_s", self.release_s, "0 to 5 s"));
        }
        Ok(())
    }
}

/// Desired compressor gain for an instantaneous level.
///
/// Hard knee: `(level/threshold)^(1/ratio - 1)` above threshold. Soft knee
/// blends the effective ratio linearly from 1 to `ratio` across `knee_db`
/// above threshold, clamped to `[1, ratio]`.
fn compressor_gain(level: f32, threshold: f32, threshold_db: f32, params: &CompressorParams) -> f32 {
    if level <= threshold {
        return 1.0;
    }

    let effective_ratio = if params.knee_db > 0.0 {
        let level_db = 20.0 * (level + EPSILON).log10();
        let blend = ((level_db - threshold_db) / params.knee_db).clamp(0.0, 1.0);
        (1.0 + (params.ratio - 1.0) * blend).clamp(1.0, params.ratio)
    } else {
        params.ratio
    };

    (level / threshold).powf(1.0 / effective_ratio - 1.0)
}

/// Downward compressor with soft knee and makeup gain
pub fn compressor(input: &[f32], sample_rate: u32, params: &CompressorParams) -> Result<Vec<f32>> {
    params.validate()?;
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let threshold = 10.0_f32.powf(params.threshold_db / 20.0);
    let makeup = 10.0_f32.powf(params.makeup_gain_db / 20.0);
    let mut envelope = EnvelopeFollower::new(params.attack_s, params.release_s, sample_rate);

    let output = input
        .iter()
        .map(|&x| {
            let desired = compressor_gain(x.abs(), threshold, params.threshold_db, params);
            x * envelope.step(desired) * makeup
        })
        .collect();
    Ok(output)
}

/// Brickwall limiter.
///
/// Gain reduction is instantaneous so no sample can exceed the ceiling;
/// recovery is smoothed with the release coefficient only.
pub fn limiter(input: &[f32], sample_rate: u32, params: &LimiterParams) -> Result<Vec<f32>> {
    params.validate()?;
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let threshold = 10.0_f32.powf(params.threshold_db / 20.0);
    let mut envelope = EnvelopeFollower::new(0.0, params.release_s, sample_rate);

    let output = input
        .iter()
        .map(|&x| {
            let level = x.abs();
            let desired = if level > threshold {
                threshold / (level + EPSILON)
            } else {
                1.0
            };
            x * envelope.step_instant_attack(desired)
        })
        .collect();
    Ok(output)
}
