//! Low-frequency oscillator
//!
//! Periodic control signal driving tremolo, vibrato, wah-wah, phaser, and the
//! chorus/flanger modulated-delay core. Output is in [-1, 1].

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// LFO waveform shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
}

/// Phase-accumulator oscillator.
///
/// Phase is kept as a fraction of a cycle in [0, 1) and wraps every cycle,
/// so arbitrarily long buffers never lose precision to a growing argument.
#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f32,
    increment: f32,
    waveform: Waveform,
}

impl Lfo {
    /// Create an oscillator at `rate_hz` for the given sample rate
    pub fn new(rate_hz: f32, sample_rate: u32, waveform: Waveform) -> Self {
        Self {
            phase: 0.0,
            increment: rate_hz / sample_rate as f32,
            waveform,
        }
    }

    /// Start the cycle at `phase_offset` (fraction of a cycle, wrapped)
    pub fn with_phase(mut self, phase_offset: f32) -> Self {
        self.phase = phase_offset.rem_euclid(1.0);
        self
    }

    /// Current waveform value without advancing
    pub fn value(&self) -> f32 {
        match self.waveform {
            Waveform::Sine => (self.phase * TAU).sin(),
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => {
                // -1 -> 1 over the first half cycle, back down over the second
                4.0 * (self.phase - (self.phase + 0.5).floor()).abs() - 1.0
            }
        }
    }

    /// Produce the next sample and advance the phase
    pub fn next(&mut self) -> f32 {
        let out = self.value();
        self.phase = (self.phase + self.increment).rem_euclid(1.0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn test_sine_starts_at_zero_and_peaks() {
        let mut lfo = Lfo::new(1.0, 4, Waveform::Sine);
        assert_abs_diff_eq!(lfo.next(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lfo.next(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(lfo.next(), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(lfo.next(), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_square_half_cycles() {
        let mut lfo = Lfo::new(1.0, 4, Waveform::Square);
        assert_eq!(lfo.next(), 1.0);
        assert_eq!(lfo.next(), 1.0);
        assert_eq!(lfo.next(), -1.0);
        assert_eq!(lfo.next(), -1.0);
    }

    #[test]
    fn test_triangle_ramp() {
        let mut lfo = Lfo::new(1.0, 8, Waveform::Triangle);
        let values: Vec<f32> = (0..8).map(|_| lfo.next()).collect();
        assert_abs_diff_eq!(values[0], -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(values[2], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(values[4], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(values[6], 0.0, epsilon = 1e-6);
    }

    #[test_case(Waveform::Sine)]
    #[test_case(Waveform::Square)]
    #[test_case(Waveform::Triangle)]
    fn test_output_bounded(waveform: Waveform) {
        let mut lfo = Lfo::new(3.7, 1000, waveform);
        for _ in 0..5000 {
            let v = lfo.next();
            assert!((-1.0..=1.0).contains(&v), "LFO out of range: {}", v);
        }
    }

    #[test]
    fn test_phase_offset_wraps() {
        let lfo = Lfo::new(1.0, 100, Waveform::Sine).with_phase(1.25);
        assert_abs_diff_eq!(lfo.value(), 1.0, epsilon = 1e-6);
    }
}
