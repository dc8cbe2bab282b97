//! Attack/release envelope follower
//!
//! Gain-smoothing state machine shared by the compressor and limiter. The
//! follower moves its gain toward a per-sample target using one of two
//! exponential coefficients depending on direction: the attack coefficient
//! when gain is falling (signal getting louder), the release coefficient when
//! it is recovering.

/// One-pole gain smoother with separate attack and release time constants.
///
/// Gain starts at 1.0. State is scoped to a single effect invocation; the
/// engine never carries envelope state across calls.
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    gain: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    /// Create a follower from time constants in seconds.
    ///
    /// Coefficients are `exp(-1 / (time * sample_rate))`; a zero or negative
    /// time collapses to instantaneous response.
    pub fn new(attack_s: f32, release_s: f32, sample_rate: u32) -> Self {
        Self {
            gain: 1.0,
            attack_coeff: Self::coefficient(attack_s, sample_rate),
            release_coeff: Self::coefficient(release_s, sample_rate),
        }
    }

    fn coefficient(time_s: f32, sample_rate: u32) -> f32 {
        let samples = time_s * sample_rate as f32;
        if samples > 0.0 {
            (-1.0 / samples).exp()
        } else {
            0.0
        }
    }

    /// Current smoothed gain
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Smooth toward `desired` and return the updated gain
    pub fn step(&mut self, desired: f32) -> f32 {
        let coeff = if desired < self.gain {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.gain = coeff * self.gain + (1.0 - coeff) * desired;
        self.gain
    }

    /// Drop the gain to `desired` immediately if it is lower, otherwise
    /// recover through the release coefficient. Used by the limiter, where
    /// gain reduction must be effectively instantaneous.
    pub fn step_instant_attack(&mut self, desired: f32) -> f32 {
        if desired < self.gain {
            self.gain = desired;
        } else {
            self.gain = self.release_coeff * self.gain + (1.0 - self.release_coeff) * desired;
        }
        self.gain
    }
}
