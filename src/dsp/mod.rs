//! Signal processing building blocks and effects
//!
//! Submodules are grouped by effect family. The small helpers (delay line,
//! envelope follower, LFO, biquad filters) are call-scoped: every effect
//! allocates its own working state, runs, and drops it, so the engine
//! itself stays stateless.

pub mod chain;
pub mod delay;
pub mod delay_line;
pub mod dynamics;
pub mod envelope;
pub mod filter;
pub mod lfo;
pub mod modulation;
pub mod phaser;
pub mod pitch;
pub mod restore;
pub mod reverb;
pub mod utility;

pub use chain::{EffectChain, EffectDescriptor};
pub use delay::DelayParams;
pub use dynamics::{CompressorParams, LimiterParams};
pub use filter::EqualizerParams;
pub use lfo::Waveform;
pub use modulation::{ChorusParams, FlangerParams, TremoloParams, VibratoParams, WahWahParams};
pub use phaser::PhaserParams;
pub use pitch::{AutoTuneParams, ScaleKind, VoiceModifyParams};
pub use restore::{ClickRemovalParams, NoiseReductionParams};
pub use reverb::ReverbParams;
