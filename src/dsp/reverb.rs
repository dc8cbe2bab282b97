//! Algorithmic reverb
//!
//! Parallel bank of 8 damped comb filters with fixed delay times and a
//! decreasing gain ladder, summed into a tail that runs serially through 3
//! all-pass diffusion stages to smear the discrete echoes into continuous
//! reverberation. Optional pre-delay silence precedes the bank. The final
//! output is `dry * input + wet * diffused_tail`, truncated to the input
//! length.

use super::delay_line::DelayLine;
use crate::error::{invalid_param, Result};
use serde::{Deserialize, Serialize};

/// Comb delay times in milliseconds
const COMB_DELAYS_MS: [f32; 8] = [25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0];

/// Decreasing comb gain ladder
const COMB_GAINS: [f32; 8] = [0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1];

/// All-pass diffusion delays in milliseconds
const ALLPASS_DELAYS_MS: [f32; 3] = [5.0, 10.0, 15.0];

/// All-pass diffusion gains
const ALLPASS_GAINS: [f32; 3] = [0.5, 0.3, 0.2];

fn default_room_size() -> f32 {
    0.5
}
fn default_damping() -> f32 {
    0.5
}
fn default_wet() -> f32 {
    0.3
}
fn default_dry() -> f32 {
    0.7
}
fn default_width() -> f32 {
    1.0
}
fn default_pre_delay_s() -> f32 {
    0.01
}

/// Reverb parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverbParams {
    /// Room size: 0 (tight) to 1 (large); scales the comb delay times
    #[serde(default = "default_room_size")]
    pub room_size: f32,
    /// Damping: 0 (bright) to 1 (dark)
    #[serde(default = "default_damping")]
    pub damping: f32,
    /// Wet (tail) mix level (0 to 1)
    #[serde(default = "default_wet")]
    pub wet: f32,
    /// Dry (input) mix level (0 to 1)
    #[serde(default = "default_dry")]
    pub dry: f32,
    /// Stereo width (0 to 1). Accepted for descriptor compatibility; a mono
    /// render leaves it inert.
    #[serde(default = "default_width")]
    pub width: f32,
    /// Pre-delay in seconds (0 to 0.1)
    #[serde(default = "default_pre_delay_s")]
    pub pre_delay_s: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            room_size: default_room_size(),
            damping: default_damping(),
            wet: default_wet(),
            dry: default_dry(),
            width: default_width(),
            pre_delay_s: default_pre_delay_s(),
        }
    }
}

impl ReverbParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("room_size", self.room_size),
            ("damping", self.damping),
            ("wet", self.wet),
            ("dry", self.dry),
            ("width", self.width),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid_param(name, value, "0.0 to 1.0"));
            }
        }
        if !(0.0..=0.1).contains(&self.pre_delay_s) {
            return Err(invalid_param("pre_delay_s", self.pre_delay_s, "0 to 0.1 s"));
        }
        Ok(())
    }
}

/// Damped feedback comb filter
#[derive(Debug, Clone)]
struct Comb {
    line: DelayLine,
    gain: f32,
    damping: f32,
    filter_state: f32,
}

impl Comb {
    fn new(delay_samples: usize, gain: f32, damping: f32) -> Self {
        Self {
            line: DelayLine::new(delay_samples),
            gain,
            damping,
            filter_state: 0.0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read();
        // One-pole low-pass in the feedback path
        self.filter_state = delayed * (1.0 - self.damping) + self.filter_state * self.damping;
        self.line.write_and_advance(input + self.filter_state * self.gain);
        delayed
    }
}

/// All-pass diffusion stage
#[derive(Debug, Clone)]
struct Allpass {
    line: DelayLine,
    gain: f32,
}

impl Allpass {
    fn new(delay_samples: usize, gain: f32) -> Self {
        Self {
            line: DelayLine::new(delay_samples),
            gain,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.line.read();
        let output = delayed - self.gain * input;
        self.line.write_and_advance(input + self.gain * output);
        output
    }
}

/// Comb-bank + all-pass diffusion reverb
pub fn reverb(input: &[f32], sample_rate: u32, params: &ReverbParams) -> Result<Vec<f32>> {
    params.validate()?;
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let sr = sample_rate as f32;
    // Room size scales the comb delays between 0.5x and 1.5x
    let room_scale = 0.5 + params.room_size;

    let mut combs: Vec<Comb> = COMB_DELAYS_MS
        .iter()
        .zip(COMB_GAINS.iter())
        .map(|(&ms, &gain)| {
            let samples = (ms / 1000.0 * room_scale * sr).round().max(1.0) as usize;
            Comb::new(samples, gain, params.damping)
        })
        .collect();

    let mut allpasses: Vec<Allpass> = ALLPASS_DELAYS_MS
        .iter()
        .zip(ALLPASS_GAINS.iter())
        .map(|(&ms, &gain)| {
            let samples = (ms / 1000.0 * sr).round().max(1.0) as usize;
            Allpass::new(samples, gain)
        })
        .collect();

    let pre_delay_samples = (params.pre_delay_s * sr).round() as usize;

    let output = input
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            // Pre-delay: the bank hears silence for the first few ms
            let bank_input = if i >= pre_delay_samples {
                input[i - pre_delay_samples]
            } else {
                0.0
            };

            let tail: f32 = combs.iter_mut().map(|c| c.process(bank_input)).sum();
            let diffused = allpasses.iter_mut().fold(tail, |acc, ap| ap.process(acc));

            params.dry * x + params.wet * diffused
        })
        .collect();
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    fn impulse(len: usize) -> Vec<f32> {
        let mut buf = vec![0.0; len];
        buf[0] = 1.0;
        buf
    }

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|s| s * s).sum()
    }

    #[test]
    fn test_param_validation() {
        let mut params = ReverbParams::default();
        assert!(params.validate().is_ok());

        params.room_size = 1.5;
        assert!(params.validate().is_err());
        params.room_size = 0.5;

        params.pre_delay_s = 0.5;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_impulse_grows_a_tail() {
        let input = impulse(SR as usize); // 1 s
        let params = ReverbParams {
            pre_delay_s: 0.0,
            ..Default::default()
        };
        let output = reverb(&input, SR, &params).unwrap();

        assert_eq!(output.len(), input.len());
        // There must be energy well after the impulse
        let late = energy(&output[8820..]); // after 200 ms
        assert!(late > 1e-4, "no reverb tail: {}", late);
    }

    #[test]
    fn test_tail_decays() {
        let input = impulse(SR as usize * 2);
        let output = reverb(&input, SR, &ReverbParams::default()).unwrap();

        let early = energy(&output[4410..22050]);
        let late = energy(&output[66150..]);
        assert!(
            late < early,
            "tail should decay: early {} late {}",
            early,
            late
        );
    }

    #[test]
    fn test_pre_delay_shifts_tail_onset() {
        let input = impulse(SR as usize);
        let no_pre = ReverbParams {
            pre_delay_s: 0.0,
            dry: 0.0,
            wet: 1.0,
            ..Default::default()
        };
        let with_pre = ReverbParams {
            pre_delay_s: 0.05,
            ..no_pre.clone()
        };

        let out_no = reverb(&input, SR, &no_pre).unwrap();
        let out_pre = reverb(&input, SR, &with_pre).unwrap();

        let first_nonzero = |buf: &[f32]| buf.iter().position(|s| s.abs() > 1e-6).unwrap();
        let onset_no = first_nonzero(&out_no);
        let onset_pre = first_nonzero(&out_pre);
        // 50 ms of pre-delay pushes the onset back by ~2205 samples
        assert!(
            onset_pre >= onset_no + 2000,
            "pre-delay should shift the onset: {} vs {}",
            onset_no,
            onset_pre
        );
    }

    #[test]
    fn test_dry_only_is_identity() {
        let input: Vec<f32> = (0..4096)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SR as f32).sin())
            .collect();
        let params = ReverbParams {
            wet: 0.0,
            dry: 1.0,
            ..Default::default()
        };
        let output = reverb(&input, SR, &params).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_silence_in_silence_out() {
        let input = vec![0.0; 8192];
        let output = reverb(&input, SR, &ReverbParams::default()).unwrap();
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_larger_room_later_first_echo() {
        let input = impulse(SR as usize);
        let small = ReverbParams {
            room_size: 0.0,
            damping: 0.0,
            wet: 1.0,
            dry: 0.0,
            pre_delay_s: 0.0,
            ..Default::default()
        };
        let large = ReverbParams {
            room_size: 1.0,
            ..small.clone()
        };

        let small_out = reverb(&input, SR, &small).unwrap();
        let large_out = reverb(&input, SR, &large).unwrap();

        let first_nonzero = |buf: &[f32]| buf.iter().position(|s| s.abs() > 1e-6).unwrap();
        assert!(
            first_nonzero(&large_out) > first_nonzero(&small_out),
            "larger room should respond later"
        );
    }
}
