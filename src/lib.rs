//! Cadenza - Chainable Audio Effects Engine
//!
//! Cadenza transforms finite in-memory sample buffers through ordered chains
//! of digital audio effects: gain/EQ, dynamics, time-based, modulation,
//! pitch/voice, restoration, and utility processors.
//!
//! # Architecture
//!
//! The only long-lived object is the [`Engine`], which holds an immutable
//! sample rate. Every effect call takes a read-only input slice and returns a
//! freshly allocated output buffer; all working state (delay lines, envelope
//! followers, LFO phases, FFT scratch) lives inside the single call. This
//! makes `&Engine` safe to share across threads with no locks.
//!
//! # Example
//!
//! ```
//! use cadenza::{Engine, EffectDescriptor};
//!
//! let engine = Engine::new(44100).unwrap();
//! let input: Vec<f32> = (0..44100)
//!     .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
//!     .collect();
//!
//! let chain = vec![
//!     EffectDescriptor::Gain { gain_db: 6.0 },
//!     EffectDescriptor::Normalize { target_peak: 0.95 },
//! ];
//! let output = engine.apply_chain(&input, &chain);
//! assert_eq!(output.len(), input.len());
//! ```

pub mod dsp;
pub mod engine;
pub mod error;

pub use dsp::chain::{EffectChain, EffectDescriptor};
pub use engine::Engine;
pub use error::{CadenzaError, Result};
