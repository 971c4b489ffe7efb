//! fmpoly - Real-time polyphonic FM synthesizer
//!
//! Live MIDI note events start and stop voices in a shared registry. The
//! audio callback renders every sounding voice as a two-oscillator FM tone,
//! keeping each voice's phase continuous from one block to the next.

pub mod config;
pub mod engine;
pub mod error;
pub mod synth;

pub use config::SynthConfig;
pub use engine::Engine;
pub use error::SynthError;
