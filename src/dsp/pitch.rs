//! Pitch and voice effects
//!
//! Pitch shifting is resample-based: the buffer is stretched by the shift
//! ratio and then forced back to its original length, so pitch moves at the
//! cost of some content at the tail. Auto-tune detects pitch per window with
//! autocorrelation and snaps it toward the nearest scale note.

use super::filter;
use crate::error::{invalid_param, Result};
use serde::{Deserialize, Serialize};

/// Speed of sound in air, m/s
const SPEED_OF_SOUND: f32 = 343.0;

/// Plausible vocal pitch band for detection, Hz
const PITCH_MIN_HZ: f32 = 75.0;
const PITCH_MAX_HZ: f32 = 1000.0;

/// Auto-tune windowing
const TUNE_WINDOW: usize = 2048;
const TUNE_HOP: usize = 512;

const MAJOR_DEGREES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_DEGREES: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];

fn default_correction_speed() -> f32 {
    0.8
}
fn default_retune_amount() -> f32 {
    1.0
}

/// Musical scale used for auto-tune note snapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    #[default]
    Major,
    Minor,
    Chromatic,
}

impl ScaleKind {
    /// True if the pitch class (0..12) belongs to this scale over `root`.
    fn contains(&self, root: u8, pitch_class: i32) -> bool {
        let rel = (pitch_class - root as i32).rem_euclid(12);
        match self {
            ScaleKind::Major => MAJOR_DEGREES.contains(&rel),
            ScaleKind::Minor => MINOR_DEGREES.contains(&rel),
            ScaleKind::Chromatic => true,
        }
    }
}

/// Auto-tune parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoTuneParams {
    /// Scale root as a pitch class, 0 = C through 11 = B
    #[serde(default)]
    pub root_note: u8,
    /// Scale to snap detected pitches onto
    #[serde(default)]
    pub scale: ScaleKind,
    /// How much of the computed correction to apply per window (0 to 1)
    #[serde(default = "default_correction_speed")]
    pub correction_speed: f32,
    /// Overall effect strength (0 = off, 1 = full snap)
    #[serde(default = "default_retune_amount")]
    pub retune_amount: f32,
}

impl Default for AutoTuneParams {
    fn default() -> Self {
        Self {
            root_note: 0,
            scale: ScaleKind::default(),
            correction_speed: default_correction_speed(),
            retune_amount: default_retune_amount(),
        }
    }
}

impl AutoTuneParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if self.root_note > 11 {
            return Err(invalid_param("root_note", self.root_note, "0 to 11"));
        }
        if !(0.0..=1.0).contains(&self.correction_speed) {
            return Err(invalid_param(
                "correction_speed",
                self.correction_speed,
                "0.0 to 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.retune_amount) {
            return Err(invalid_param(
                "retune_amount",
                self.retune_amount,
                "0.0 to 1.0",
            ));
        }
        Ok(())
    }
}

/// Voice-modify parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceModifyParams {
    /// Pitch shift in semitones (-24 to 24)
    #[serde(default)]
    pub semitones: f32,
    /// Coarse timbre control (-1 = larger/deeper, 0 = neutral,
    /// 1 = smaller/brighter)
    #[serde(default)]
    pub formant: f32,
    /// Reserved for a true formant-preserving shifter; the current
    /// resample-based shifter moves formants along with pitch.
    #[serde(default)]
    pub preserve_formants: bool,
}

impl Default for VoiceModifyParams {
    fn default() -> Self {
        Self {
            semitones: 0.0,
            formant: 0.0,
            preserve_formants: false,
        }
    }
}

impl VoiceModifyParams {
    /// Validate parameters against their documented ranges
    pub fn validate(&self) -> Result<()> {
        if !(-24.0..=24.0).contains(&self.semitones) {
            return Err(invalid_param(
                "semitones",
                self.semitones,
                "-24 to 24 semitones",
            ));
        }
        if !(-1.0..=1.0).contains(&self.formant) {
            return Err(invalid_param("formant", self.formant, "-1.0 to 1.0"));
        }
        Ok(())
    }
}

/// Linear-interpolation resample by `ratio`. Output holds
/// `round(len / ratio)` samples; `ratio > 1` shortens (raises pitch when the
/// result is played at the original rate), `ratio < 1` lengthens.
pub(crate) fn resample_linear(input: &[f32], ratio: f32) -> Vec<f32> {
    if input.is_empty() {
        return Vec::new();
    }
    let out_len = ((input.len() as f32 / ratio).round() as usize).max(1);
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f32 * ratio;
            let i0 = (pos.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let frac = pos - i0 as f32;
            input[i0] * (1.0 - frac) + input[i1] * frac
        })
        .collect()
}

/// Resample by `ratio` and force the result back to `input`'s length,
/// truncating or zero-padding the tail.
fn shift_by_ratio(input: &[f32], ratio: f32) -> Vec<f32> {
    let mut shifted = resample_linear(input, ratio);
    shifted.resize(input.len(), 0.0);
    shifted
}

/// Shift pitch by a semitone amount. Length is invariant; content lost or
/// gained by the stretch shows up as a truncated or zero-padded tail.
pub fn pitch_shift(input: &[f32], semitones: f32) -> Result<Vec<f32>> {
    if !(-24.0..=24.0).contains(&semitones) {
        return Err(invalid_param(
            "semitones",
            semitones,
            "-24 to 24 semitones",
        ));
    }
    if semitones == 0.0 {
        return Ok(input.to_vec());
    }
    Ok(shift_by_ratio(input, 2.0f32.powf(semitones / 12.0)))
}

/// Estimate the fundamental of a window by autocorrelation.
///
/// The lag search is restricted to 75 Hz-1000 Hz. Returns 0.0 if the window
/// is too short for the band or no positive correlation peak exists.
pub fn detect_pitch(window: &[f32], sample_rate: u32) -> f32 {
    let min_lag = (sample_rate as f32 / PITCH_MAX_HZ) as usize;
    let max_lag = (sample_rate as f32 / PITCH_MIN_HZ) as usize;
    if min_lag == 0 || window.len() <= max_lag {
        return 0.0;
    }

    let mut best_lag = 0;
    let mut best_corr = 0.0f32;
    for lag in min_lag..=max_lag {
        let corr: f32 = window[..window.len() - lag]
            .iter()
            .zip(&window[lag..])
            .map(|(a, b)| a * b)
            .sum();
        if corr > best_corr {
            best_corr = corr;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        0.0
    } else {
        sample_rate as f32 / best_lag as f32
    }
}

/// Nearest MIDI note (as a float semitone distance from `midi`) whose pitch
/// class lies in the scale.
fn snap_correction(midi: f32, root: u8, scale: ScaleKind) -> f32 {
    let nearest = midi.round() as i32;
    let mut best = 0i32;
    let mut best_dist = f32::INFINITY;
    for candidate in (nearest - 6)..=(nearest + 6) {
        if scale.contains(root, candidate.rem_euclid(12)) {
            let dist = (candidate as f32 - midi).abs();
            if dist < best_dist {
                best_dist = dist;
                best = candidate;
            }
        }
    }
    best as f32 - midi
}

/// Snap each window's detected pitch toward the nearest scale note.
///
/// Windows are overwritten in place without cross-fading, so strong
/// corrections can be audibly discontinuous at window boundaries.
pub fn auto_tune(input: &[f32], sample_rate: u32, params: &AutoTuneParams) -> Result<Vec<f32>> {
    params.validate()?;

    if input.len() < TUNE_WINDOW {
        return Ok(input.to_vec());
    }

    let mut output = input.to_vec();
    let strength = params.correction_speed * params.retune_amount;

    let mut start = 0;
    while start + TUNE_WINDOW <= input.len() {
        let segment = &input[start..start + TUNE_WINDOW];
        let pitch = detect_pitch(segment, sample_rate);
        if pitch > 0.0 {
            let midi = 69.0 + 12.0 * (pitch / 440.0).log2();
            let correction = snap_correction(midi, params.root_note, params.scale) * strength;
            if correction.abs() > 1e-3 {
                let shifted = shift_by_ratio(segment, 2.0f32.powf(correction / 12.0));
                output[start..start + TUNE_WINDOW].copy_from_slice(&shifted);
            }
        }
        start += TUNE_HOP;
    }

    Ok(output)
}

/// Constant-shift Doppler approximation for a source moving at `speed` m/s.
///
/// A true Doppler sweep varies continuously with distance; this applies the
/// single ratio the classical formula gives for the stated speed.
pub fn doppler(input: &[f32], speed: f32, approaching: bool) -> Result<Vec<f32>> {
    if !(0.0..SPEED_OF_SOUND).contains(&speed) {
        return Err(invalid_param(
            "speed",
            speed,
            format!("0 to {SPEED_OF_SOUND} m/s (subsonic)"),
        ));
    }
    if speed == 0.0 {
        return Ok(input.to_vec());
    }

    let ratio = if approaching {
        SPEED_OF_SOUND / (SPEED_OF_SOUND - speed)
    } else {
        SPEED_OF_SOUND / (SPEED_OF_SOUND + speed)
    };
    Ok(shift_by_ratio(input, ratio))
}

/// Pitch shift composed with a coarse formant approximation: positive
/// `formant` high-passes toward a smaller, brighter voice; negative
/// low-passes toward a larger, deeper one.
pub fn voice_modify(
    input: &[f32],
    sample_rate: u32,
    params: &VoiceModifyParams,
) -> Result<Vec<f32>> {
    params.validate()?;

    let shifted = pitch_shift(input, params.semitones)?;
    if params.formant > 0.0 {
        let cutoff = 100.0 + 500.0 * params.formant;
        filter::highpass(&shifted, sample_rate, cutoff, 2)
    } else if params.formant < 0.0 {
        let cutoff = 8000.0 - 5000.0 * params.formant.abs();
        filter::lowpass(&shifted, sample_rate, cutoff, 2)
    } else {
        Ok(shifted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    const SR: u32 = 44100;

    fn sine(freq: f32, amp: f32, seconds: f32) -> Vec<f32> {
        let n = (seconds * SR as f32) as usize;
        (0..n)
            .map(|i| amp * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin())
            .collect()
    }

    #[test]
    fn test_pitch_shift_zero_is_exact_copy() {
        let input = sine(440.0, 0.5, 0.1);
        let output = pitch_shift(&input, 0.0).unwrap();
        assert_eq!(input, output);
    }

    #[test]
    fn test_pitch_shift_preserves_length() {
        let input = sine(440.0, 0.5, 0.3);
        for semitones in [-12.0, -3.0, 3.0, 12.0] {
            let output = pitch_shift(&input, semitones).unwrap();
            assert_eq!(output.len(), input.len());
        }
    }

    #[test]
    fn test_pitch_shift_up_octave_doubles_detected_pitch() {
        let input = sine(220.0, 0.5, 0.5);
        let output = pitch_shift(&input, 12.0).unwrap();

        // The raised copy only fills half the buffer; detect on that half.
        let detected = detect_pitch(&output[..input.len() / 2], SR);
        assert_relative_eq!(detected, 440.0, max_relative = 0.03);
    }

    #[test_case(-30.0; "too low")]
    #[test_case(25.0; "too high")]
    fn test_pitch_shift_rejects_out_of_range(semitones: f32) {
        assert!(pitch_shift(&[0.0; 64], semitones).is_err());
    }

    #[test_case(100.0)]
    #[test_case(220.0)]
    #[test_case(440.0)]
    #[test_case(880.0)]
    fn test_detect_pitch_on_pure_tones(freq: f32) {
        let input = sine(freq, 0.5, 0.2);
        let detected = detect_pitch(&input, SR);
        assert_relative_eq!(detected, freq, max_relative = 0.03);
    }

    #[test]
    fn test_detect_pitch_silence_returns_zero() {
        let input = vec![0.0f32; 4096];
        assert_eq!(detect_pitch(&input, SR), 0.0);
    }

    #[test]
    fn test_detect_pitch_short_window_returns_zero() {
        let input = sine(440.0, 0.5, 0.005);
        assert_eq!(detect_pitch(&input, SR), 0.0);
    }

    #[test]
    fn test_snap_correction_prefers_nearest_scale_note() {
        // 30 cents above A (midi 69); A is in C major, so snap down.
        let correction = snap_correction(69.3, 0, ScaleKind::Major);
        assert_relative_eq!(correction, -0.3, epsilon = 1e-5);

        // C# (midi 61) is not in C major; nearest scale notes are C and D.
        let correction = snap_correction(61.0, 0, ScaleKind::Major);
        assert_eq!(correction.abs(), 1.0);
    }

    #[test]
    fn test_snap_correction_chromatic_rounds_to_semitone() {
        let correction = snap_correction(64.4, 0, ScaleKind::Chromatic);
        assert_relative_eq!(correction, -0.4, epsilon = 1e-5);
    }

    #[test]
    fn test_auto_tune_pulls_flat_tone_toward_scale_note() {
        // Noticeably flat A: about a quarter tone below 440 Hz.
        let input = sine(428.0, 0.5, 0.5);
        let params = AutoTuneParams {
            correction_speed: 1.0,
            retune_amount: 1.0,
            ..Default::default()
        };
        let output = auto_tune(&input, SR, &params).unwrap();

        let flat_error = (detect_pitch(&input[..TUNE_WINDOW], SR) - 440.0).abs();
        let tuned_error = (detect_pitch(&output[..TUNE_WINDOW], SR) - 440.0).abs();
        assert!(
            tuned_error < flat_error,
            "tuning should move {flat_error} Hz error down, got {tuned_error}"
        );
    }

    #[test]
    fn test_auto_tune_short_input_unchanged() {
        let input = sine(440.0, 0.5, 0.01);
        let output = auto_tune(&input, SR, &AutoTuneParams::default()).unwrap();
        assert_eq!(input, output);
    }

    #[test]
    fn test_doppler_approaching_raises_pitch() {
        let input = sine(440.0, 0.5, 0.5);
        let output = doppler(&input, 30.0, true).unwrap();

        let detected = detect_pitch(&output[..input.len() / 2], SR);
        let expected = 440.0 * SPEED_OF_SOUND / (SPEED_OF_SOUND - 30.0);
        assert_relative_eq!(detected, expected, max_relative = 0.03);
    }

    #[test]
    fn test_doppler_receding_lowers_pitch() {
        let input = sine(440.0, 0.5, 0.5);
        let output = doppler(&input, 30.0, false).unwrap();

        let detected = detect_pitch(&output[..input.len() / 2], SR);
        let expected = 440.0 * SPEED_OF_SOUND / (SPEED_OF_SOUND + 30.0);
        assert_relative_eq!(detected, expected, max_relative = 0.03);
    }

    #[test]
    fn test_doppler_rejects_supersonic() {
        assert!(doppler(&[0.0; 64], 343.0, true).is_err());
        assert!(doppler(&[0.0; 64], -1.0, true).is_err());
    }

    #[test]
    fn test_voice_modify_neutral_is_plain_shift() {
        let input = sine(440.0, 0.5, 0.2);
        let params = VoiceModifyParams {
            semitones: 3.0,
            ..Default::default()
        };
        let modified = voice_modify(&input, SR, &params).unwrap();
        let shifted = pitch_shift(&input, 3.0).unwrap();
        assert_eq!(modified, shifted);
    }

    #[test]
    fn test_voice_modify_deeper_removes_highs() {
        let high = sine(10000.0, 0.5, 0.2);
        let params = VoiceModifyParams {
            formant: -1.0,
            ..Default::default()
        };
        let output = voice_modify(&high, SR, &params).unwrap();

        let in_rms = (high.iter().map(|x| x * x).sum::<f32>() / high.len() as f32).sqrt();
        let out_rms = (output.iter().map(|x| x * x).sum::<f32>() / output.len() as f32).sqrt();
        assert!(out_rms < in_rms * 0.2);
    }

    #[test]
    fn test_resample_linear_stretch_factor() {
        let input = vec![0.0f32; 1000];
        assert_eq!(resample_linear(&input, 2.0).len(), 500);
        assert_eq!(resample_linear(&input, 0.5).len(), 2000);
    }
}
