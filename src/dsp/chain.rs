//! Effect chain descriptors
//!
//! An [`EffectDescriptor`] names one effect plus its parameters; an
//! [`EffectChain`] is an ordered list of them. Chains serialize as a JSON
//! array of internally tagged objects, and tags this build does not
//! recognize deserialize to [`EffectDescriptor::Unknown`] instead of
//! failing, so a chain written by a newer build still loads.

use super::delay::DelayParams;
use super::dynamics::{CompressorParams, LimiterParams};
use super::filter::EqualizerParams;
use super::modulation::{ChorusParams, FlangerParams, TremoloParams, VibratoParams, WahWahParams};
use super::phaser::PhaserParams;
use super::pitch::{AutoTuneParams, VoiceModifyParams};
use super::restore::{ClickRemovalParams, NoiseReductionParams};
use super::reverb::ReverbParams;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One effect plus its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectDescriptor {
    Gain { gain_db: f32 },
    Amplify { factor: f32 },
    Normalize { target_peak: f32 },
    Invert,
    FadeIn { duration_s: f32 },
    FadeOut { duration_s: f32 },
    ChannelSwap,
    ChannelInvert { channel: u8 },
    SpeedChange { factor: f32 },
    Lowpass { cutoff_hz: f32, order: usize },
    Highpass { cutoff_hz: f32, order: usize },
    Bandpass { low_hz: f32, high_hz: f32, order: usize },
    Equalizer(EqualizerParams),
    Compressor(CompressorParams),
    Limiter(LimiterParams),
    Delay(DelayParams),
    Reverb(ReverbParams),
    Phaser(PhaserParams),
    Chorus(ChorusParams),
    Flanger(FlangerParams),
    Tremolo(TremoloParams),
    Vibrato(VibratoParams),
    WahWah(WahWahParams),
    PitchShift { semitones: f32 },
    AutoTune(AutoTuneParams),
    Doppler { speed: f32, approaching: bool },
    VoiceModify(VoiceModifyParams),
    DcCorrection,
    ClickRemoval(ClickRemovalParams),
    NoiseReduction(NoiseReductionParams),
    /// Catch-all for tags this build does not recognize. The chain
    /// executor logs and skips it.
    #[serde(other)]
    Unknown,
}

impl EffectDescriptor {
    /// Stable name used in log messages.
    pub fn name(&self) -> &'static str {
        match self {
            EffectDescriptor::Gain { .. } => "gain",
            EffectDescriptor::Amplify { .. } => "amplify",
            EffectDescriptor::Normalize { .. } => "normalize",
            EffectDescriptor::Invert => "invert",
            EffectDescriptor::FadeIn { .. } => "fade_in",
            EffectDescriptor::FadeOut { .. } => "fade_out",
            EffectDescriptor::ChannelSwap => "channel_swap",
            EffectDescriptor::ChannelInvert { .. } => "channel_invert",
            EffectDescriptor::SpeedChange { .. } => "speed_change",
            EffectDescriptor::Lowpass { .. } => "lowpass",
            EffectDescriptor::Highpass { .. } => "highpass",
            EffectDescriptor::Bandpass { .. } => "bandpass",
            EffectDescriptor::Equalizer(_) => "equalizer",
            EffectDescriptor::Compressor(_) => "compressor",
            EffectDescriptor::Limiter(_) => "limiter",
            EffectDescriptor::Delay(_) => "delay",
            EffectDescriptor::Reverb(_) => "reverb",
            EffectDescriptor::Phaser(_) => "phaser",
            EffectDescriptor::Chorus(_) => "chorus",
            EffectDescriptor::Flanger(_) => "flanger",
            EffectDescriptor::Tremolo(_) => "tremolo",
            EffectDescriptor::Vibrato(_) => "vibrato",
            EffectDescriptor::WahWah(_) => "wah_wah",
            EffectDescriptor::PitchShift { .. } => "pitch_shift",
            EffectDescriptor::AutoTune(_) => "auto_tune",
            EffectDescriptor::Doppler { .. } => "doppler",
            EffectDescriptor::VoiceModify(_) => "voice_modify",
            EffectDescriptor::DcCorrection => "dc_correction",
            EffectDescriptor::ClickRemoval(_) => "click_removal",
            EffectDescriptor::NoiseReduction(_) => "noise_reduction",
            EffectDescriptor::Unknown => "unknown",
        }
    }
}

/// Ordered list of effect descriptors. Order is significant; an empty
/// chain is the identity transform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectChain {
    pub effects: Vec<EffectDescriptor>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, descriptor: EffectDescriptor) -> &mut Self {
        self.effects.push(descriptor);
        self
    }

    /// Parse a chain from a JSON array, logging any tags that did not
    /// match a known effect.
    pub fn from_json(json: &str) -> Result<Self> {
        let chain: EffectChain = serde_json::from_str(json)?;

        let raw: serde_json::Value = serde_json::from_str(json)?;
        if let Some(items) = raw.as_array() {
            for (descriptor, item) in chain.effects.iter().zip(items) {
                if matches!(descriptor, EffectDescriptor::Unknown) {
                    let tag = item
                        .get("type")
                        .and_then(|t| t.as_str())
                        .unwrap_or("<missing>");
                    warn!(tag, "unrecognized effect type in chain");
                }
            }
        }
        Ok(chain)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
