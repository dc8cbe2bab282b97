//! Engine facade
//!
//! [`Engine`] pins a sample rate at construction and exposes every effect as
//! a method taking a read-only input slice and returning a fresh buffer.
//! The engine holds no mutable state, so one instance can serve concurrent
//! calls from multiple threads.

use crate::dsp::chain::EffectDescriptor;
use crate::dsp::{chain, delay, dynamics, filter, modulation, phaser, pitch, restore, reverb, utility};
use crate::error::{CadenzaError, Result};
use tracing::{debug, warn};

/// Stateless effects engine bound to one sample rate.
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    sample_rate: u32,
    nyquist: f32,
}

impl Engine {
    /// Create an engine for the given sample rate.
    pub fn new(sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CadenzaError::InvalidSampleRate { sample_rate });
        }
        Ok(Self {
            sample_rate,
            nyquist: sample_rate as f32 / 2.0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn nyquist(&self) -> f32 {
        self.nyquist
    }

    // Filters and EQ

    pub fn lowpass(&self, input: &[f32], cutoff_hz: f32, order: usize) -> Result<Vec<f32>> {
        filter::lowpass(input, self.sample_rate, cutoff_hz, order)
    }

    pub fn highpass(&self, input: &[f32], cutoff_hz: f32, order: usize) -> Result<Vec<f32>> {
        filter::highpass(input, self.sample_rate, cutoff_hz, order)
    }

    pub fn bandpass(
        &self,
        input: &[f32],
        low_hz: f32,
        high_hz: f32,
        order: usize,
    ) -> Result<Vec<f32>> {
        filter::bandpass(input, self.sample_rate, low_hz, high_hz, order)
    }

    pub fn low_shelf(&self, input: &[f32], cutoff_hz: f32, gain_db: f32) -> Result<Vec<f32>> {
        filter::low_shelf(input, self.sample_rate, cutoff_hz, gain_db)
    }

    pub fn high_shelf(&self, input: &[f32], cutoff_hz: f32, gain_db: f32) -> Result<Vec<f32>> {
        filter::high_shelf(input, self.sample_rate, cutoff_hz, gain_db)
    }

    pub fn peaking(
        &self,
        input: &[f32],
        center_hz: f32,
        gain_db: f32,
        q: f32,
    ) -> Result<Vec<f32>> {
        filter::peaking(input, self.sample_rate, center_hz, gain_db, q)
    }

    pub fn equalizer(&self, input: &[f32], params: &filter::EqualizerParams) -> Result<Vec<f32>> {
        filter::equalizer(input, self.sample_rate, params)
    }

    // Dynamics

    pub fn compressor(
        &self,
        input: &[f32],
        params: &dynamics::CompressorParams,
    ) -> Result<Vec<f32>> {
        dynamics::compressor(input, self.sample_rate, params)
    }

    pub fn limiter(&self, input: &[f32], params: &dynamics::LimiterParams) -> Result<Vec<f32>> {
        dynamics::limiter(input, self.sample_rate, params)
    }

    // Time-based

    pub fn delay(&self, input: &[f32], params: &delay::DelayParams) -> Result<Vec<f32>> {
        delay::delay(input, self.sample_rate, params)
    }

    pub fn reverb(&self, input: &[f32], params: &reverb::ReverbParams) -> Result<Vec<f32>> {
        reverb::reverb(input, self.sample_rate, params)
    }

    pub fn phaser(&self, input: &[f32], params: &phaser::PhaserParams) -> Result<Vec<f32>> {
        phaser::phaser(input, self.sample_rate, params)
    }

    // Modulation

    pub fn chorus(&self, input: &[f32], params: &modulation::ChorusParams) -> Result<Vec<f32>> {
        modulation::chorus(input, self.sample_rate, params)
    }

    pub fn flanger(&self, input: &[f32], params: &modulation::FlangerParams) -> Result<Vec<f32>> {
        modulation::flanger(input, self.sample_rate, params)
    }

    pub fn tremolo(&self, input: &[f32], params: &modulation::TremoloParams) -> Result<Vec<f32>> {
        modulation::tremolo(input, self.sample_rate, params)
    }

    pub fn vibrato(&self, input: &[f32], params: &modulation::VibratoParams) -> Result<Vec<f32>> {
        modulation::vibrato(input, self.sample_rate, params)
    }

    pub fn wah_wah(&self, input: &[f32], params: &modulation::WahWahParams) -> Result<Vec<f32>> {
        modulation::wah_wah(input, self.sample_rate, params)
    }

    // Pitch and voice

    pub fn pitch_shift(&self, input: &[f32], semitones: f32) -> Result<Vec<f32>> {
        pitch::pitch_shift(input, semitones)
    }

    pub fn detect_pitch(&self, window: &[f32]) -> f32 {
        pitch::detect_pitch(window, self.sample_rate)
    }

    pub fn auto_tune(&self, input: &[f32], params: &pitch::AutoTuneParams) -> Result<Vec<f32>> {
        pitch::auto_tune(input, self.sample_rate, params)
    }

    pub fn doppler(&self, input: &[f32], speed: f32, approaching: bool) -> Result<Vec<f32>> {
        pitch::doppler(input, speed, approaching)
    }

    pub fn voice_modify(
        &self,
        input: &[f32],
        params: &pitch::VoiceModifyParams,
    ) -> Result<Vec<f32>> {
        pitch::voice_modify(input, self.sample_rate, params)
    }

    // Restoration

    pub fn dc_correction(&self, input: &[f32]) -> Vec<f32> {
        restore::dc_correction(input)
    }

    pub fn click_removal(
        &self,
        input: &[f32],
        params: &restore::ClickRemovalParams,
    ) -> Result<Vec<f32>> {
        restore::click_removal(input, params)
    }

    pub fn noise_reduction(
        &self,
        input: &[f32],
        params: &restore::NoiseReductionParams,
    ) -> Result<Vec<f32>> {
        restore::noise_reduction(input, params)
    }

    // Utility

    pub fn gain(&self, input: &[f32], gain_db: f32) -> Result<Vec<f32>> {
        utility::gain(input, gain_db)
    }

    pub fn amplify(&self, input: &[f32], factor: f32) -> Result<Vec<f32>> {
        utility::amplify(input, factor)
    }

    pub fn normalize(&self, input: &[f32], target_peak: f32) -> Result<Vec<f32>> {
        utility::normalize(input, target_peak)
    }

    pub fn invert(&self, input: &[f32]) -> Vec<f32> {
        utility::invert(input)
    }

    pub fn fade_in(&self, input: &[f32], duration_s: f32) -> Result<Vec<f32>> {
        utility::fade_in(input, self.sample_rate, duration_s)
    }

    pub fn fade_out(&self, input: &[f32], duration_s: f32) -> Result<Vec<f32>> {
        utility::fade_out(input, self.sample_rate, duration_s)
    }

    pub fn channel_swap(&self, input: &[f32]) -> Vec<f32> {
        utility::channel_swap(input)
    }

    pub fn channel_invert(&self, input: &[f32], channel: u8) -> Result<Vec<f32>> {
        utility::channel_invert(input, channel)
    }

    pub fn speed_change(&self, input: &[f32], factor: f32) -> Result<Vec<f32>> {
        utility::speed_change(input, factor)
    }

    /// Run a chain of effects left to right.
    ///
    /// The chain always completes: an [`EffectDescriptor::Unknown`] stage or
    /// a stage whose parameters fail validation is logged and skipped, and
    /// the buffer passes through it unchanged. An empty chain returns a
    /// copy of the input.
    pub fn apply_chain(&self, input: &[f32], chain: &[EffectDescriptor]) -> Vec<f32> {
        let mut result = input.to_vec();
        for descriptor in chain {
            debug!(effect = descriptor.name(), samples = result.len(), "chain stage");
            match self.apply_descriptor(&result, descriptor) {
                Ok(output) => result = output,
                Err(err) => {
                    warn!(effect = descriptor.name(), %err, "skipping chain stage");
                }
            }
        }
        result
    }

    /// Convenience wrapper over [`Engine::apply_chain`] for an owned chain.
    pub fn apply(&self, input: &[f32], chain: &chain::EffectChain) -> Vec<f32> {
        self.apply_chain(input, &chain.effects)
    }

    fn apply_descriptor(&self, input: &[f32], descriptor: &EffectDescriptor) -> Result<Vec<f32>> {
        match descriptor {
            EffectDescriptor::Gain { gain_db } => self.gain(input, *gain_db),
            EffectDescriptor::Amplify { factor } => self.amplify(input, *factor),
            EffectDescriptor::Normalize { target_peak } => self.normalize(input, *target_peak),
            EffectDescriptor::Invert => Ok(self.invert(input)),
            EffectDescriptor::FadeIn { duration_s } => self.fade_in(input, *duration_s),
            EffectDescriptor::FadeOut { duration_s } => self.fade_out(input, *duration_s),
            EffectDescriptor::ChannelSwap => Ok(self.channel_swap(input)),
            EffectDescriptor::ChannelInvert { channel } => self.channel_invert(input, *channel),
            EffectDescriptor::SpeedChange { factor } => self.speed_change(input, *factor),
            EffectDescriptor::Lowpass { cutoff_hz, order } => {
                self.lowpass(input, *cutoff_hz, *order)
            }
            EffectDescriptor::Highpass { cutoff_hz, order } => {
                self.highpass(input, *cutoff_hz, *order)
            }
            EffectDescriptor::Bandpass {
                low_hz,
                high_hz,
                order,
            } => self.bandpass(input, *low_hz, *high_hz, *order),
            EffectDescriptor::Equalizer(params) => self.equalizer(input, params),
            EffectDescriptor::Compressor(params) => self.compressor(input, params),
            EffectDescriptor::Limiter(params) => self.limiter(input, params),
            EffectDescriptor::Delay(params) => self.delay(input, params),
            EffectDescriptor::Reverb(params) => self.reverb(input, params),
            EffectDescriptor::Phaser(params) => self.phaser(input, params),
            EffectDescriptor::Chorus(params) => self.chorus(input, params),
            EffectDescriptor::Flanger(params) => self.flanger(input, params),
            EffectDescriptor::Tremolo(params) => self.tremolo(input, params),
            EffectDescriptor::Vibrato(params) => self.vibrato(input, params),
            EffectDescriptor::WahWah(params) => self.wah_wah(input, params),
            EffectDescriptor::PitchShift { semitones } => self.pitch_shift(input, *semitones),
            EffectDescriptor::AutoTune(params) => self.auto_tune(input, params),
            EffectDescriptor::Doppler { speed, approaching } => {
                self.doppler(input, *speed, *approaching)
            }
            EffectDescriptor::VoiceModify(params) => self.voice_modify(input, params),
            EffectDescriptor::DcCorrection => Ok(self.dc_correction(input)),
            EffectDescriptor::ClickRemoval(params) => self.click_removal(input, params),
            EffectDescriptor::NoiseReduction(params) => self.noise_reduction(input, params),
            EffectDescriptor::Unknown => {
                warn!("unknown effect in chain");
                Ok(input.to_vec())
            }
        }
    }
}
