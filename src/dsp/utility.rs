//! Utility effects: gain, normalize, polarity, fades, channel ops, speed
//!
//! Channel operations treat the buffer as interleaved stereo pairs; a
//! trailing odd sample has no partner and passes through unchanged.

use super::pitch::resample_linear;
use crate::error::{invalid_param, Result};

/// Apply a gain in decibels. 0 dB returns an exact copy.
pub fn gain(input: &[f32], gain_db: f32) -> Result<Vec<f32>> {
    if !(-60.0..=24.0).contains(&gain_db) {
        return Err(invalid_param("gain_db", gain_db, "-60 to 24 dB"));
    }
    if gain_db == 0.0 {
        return Ok(input.to_vec());
    }
    let factor = 10.0f32.powf(gain_db / 20.0);
    Ok(input.iter().map(|&x| x * factor).collect())
}

/// Multiply every sample by a linear factor.
pub fn amplify(input: &[f32], factor: f32) -> Result<Vec<f32>> {
    if !(0.0..=16.0).contains(&factor) {
        return Err(invalid_param("factor", factor, "0.0 to 16.0"));
    }
    Ok(input.iter().map(|&x| x * factor).collect())
}

/// Scale so the largest absolute sample lands on `target_peak`.
/// Silence has no peak to scale and is returned unchanged.
pub fn normalize(input: &[f32], target_peak: f32) -> Result<Vec<f32>> {
    if !(0.0..=1.0).contains(&target_peak) || target_peak == 0.0 {
        return Err(invalid_param(
            "target_peak",
            target_peak,
            "above 0.0, at most 1.0",
        ));
    }

    let peak = input.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
    if peak == 0.0 {
        return Ok(input.to_vec());
    }
    let factor = target_peak / peak;
    Ok(input.iter().map(|&x| x * factor).collect())
}

/// Flip polarity. Applying twice restores the original.
pub fn invert(input: &[f32]) -> Vec<f32> {
    input.iter().map(|&x| -x).collect()
}

fn validate_fade_duration(duration_s: f32) -> Result<()> {
    if !(0.0..=60.0).contains(&duration_s) {
        return Err(invalid_param("duration_s", duration_s, "0 to 60 s"));
    }
    Ok(())
}

/// Linear ramp from silence over the first `duration_s` seconds.
pub fn fade_in(input: &[f32], sample_rate: u32, duration_s: f32) -> Result<Vec<f32>> {
    validate_fade_duration(duration_s)?;

    let fade_len = ((duration_s * sample_rate as f32) as usize).min(input.len());
    Ok(input
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            if i < fade_len {
                x * i as f32 / fade_len as f32
            } else {
                x
            }
        })
        .collect())
}

/// Linear ramp to silence over the last `duration_s` seconds.
pub fn fade_out(input: &[f32], sample_rate: u32, duration_s: f32) -> Result<Vec<f32>> {
    validate_fade_duration(duration_s)?;

    let fade_len = ((duration_s * sample_rate as f32) as usize).min(input.len());
    let start = input.len() - fade_len;
    Ok(input
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            if i >= start {
                x * (input.len() - i) as f32 / fade_len as f32
            } else {
                x
            }
        })
        .collect())
}

/// Swap left and right of an interleaved stereo buffer.
pub fn channel_swap(input: &[f32]) -> Vec<f32> {
    let mut output = input.to_vec();
    for pair in output.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
    output
}

/// Flip polarity of one channel of an interleaved stereo buffer
/// (0 = left, 1 = right).
pub fn channel_invert(input: &[f32], channel: u8) -> Result<Vec<f32>> {
    if channel > 1 {
        return Err(invalid_param("channel", channel, "0 (left) or 1 (right)"));
    }
    let mut output = input.to_vec();
    for pair in output.chunks_exact_mut(2) {
        pair[channel as usize] = -pair[channel as usize];
    }
    Ok(output)
}

/// Resample by `factor`, changing both pitch and duration. The one effect
/// whose output length differs from its input.
pub fn speed_change(input: &[f32], factor: f32) -> Result<Vec<f32>> {
    if !(0.25..=4.0).contains(&factor) {
        return Err(invalid_param("factor", factor, "0.25 to 4.0"));
    }
    if factor == 1.0 {
        return Ok(input.to_vec());
    }
    Ok(resample_linear(input, factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use test_case::test_case;

    #[test]
    fn test_gain_zero_db_is_exact_identity() {
        let input = vec![0.1, -0.5, 0.9, 0.0];
        assert_eq!(gain(&input, 0.0).unwrap(), input);
    }

    #[test]
    fn test_gain_six_db_roughly_doubles() {
        let output = gain(&[0.25], 6.0).unwrap();
        assert_relative_eq!(output[0], 0.499, max_relative = 1e-3);
    }

    #[test_case(-61.0; "below range")]
    #[test_case(25.0; "above range")]
    fn test_gain_rejects_out_of_range(db: f32) {
        assert!(gain(&[0.0], db).is_err());
    }

    #[test]
    fn test_amplify() {
        assert_eq!(amplify(&[0.2, -0.4], 2.0).unwrap(), vec![0.4, -0.8]);
        assert!(amplify(&[0.0], -1.0).is_err());
    }

    #[test]
    fn test_normalize_hits_target_peak() {
        let input = vec![0.1, -0.4, 0.2];
        let output = normalize(&input, 0.95).unwrap();
        let peak = output.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
        assert_abs_diff_eq!(peak, 0.95, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_silence_unchanged() {
        let input = vec![0.0f32; 16];
        assert_eq!(normalize(&input, 0.95).unwrap(), input);
    }

    #[test]
    fn test_normalize_rejects_zero_target() {
        assert!(normalize(&[0.5], 0.0).is_err());
        assert!(normalize(&[0.5], 1.5).is_err());
    }

    #[test]
    fn test_invert_is_involution() {
        let input = vec![0.3, -0.7, 0.0];
        assert_eq!(invert(&invert(&input)), input);
    }

    #[test]
    fn test_fade_in_edges() {
        let input = vec![1.0f32; 100];
        let output = fade_in(&input, 100, 0.5).unwrap();

        assert_eq!(output[0], 0.0);
        assert!(output[25] > 0.4 && output[25] < 0.6);
        assert_eq!(output[50], 1.0);
        assert_eq!(output[99], 1.0);
    }

    #[test]
    fn test_fade_out_edges() {
        let input = vec![1.0f32; 100];
        let output = fade_out(&input, 100, 0.5).unwrap();

        assert_eq!(output[0], 1.0);
        assert_eq!(output[49], 1.0);
        assert!(output[75] > 0.4 && output[75] < 0.6);
        assert_abs_diff_eq!(output[99], 0.02, epsilon = 1e-6);
    }

    #[test]
    fn test_fade_longer_than_buffer_clamps() {
        let input = vec![1.0f32; 10];
        let output = fade_in(&input, 44100, 1.0).unwrap();
        assert_eq!(output[0], 0.0);
        assert!(output[9] < 1.0);
    }

    #[test]
    fn test_channel_swap_pairs() {
        let input = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let output = channel_swap(&input);
        assert_eq!(output, vec![2.0, 1.0, 4.0, 3.0, 5.0]);
    }

    #[test]
    fn test_channel_invert_left_only() {
        let input = vec![1.0, 2.0, 3.0, 4.0];
        let output = channel_invert(&input, 0).unwrap();
        assert_eq!(output, vec![-1.0, 2.0, -3.0, 4.0]);
        assert!(channel_invert(&input, 2).is_err());
    }

    #[test]
    fn test_speed_change_lengths() {
        let input = vec![0.0f32; 1000];
        assert_eq!(speed_change(&input, 2.0).unwrap().len(), 500);
        assert_eq!(speed_change(&input, 0.5).unwrap().len(), 2000);
        assert_eq!(speed_change(&input, 1.0).unwrap(), input);
        assert!(speed_change(&input, 5.0).is_err());
    }
}
