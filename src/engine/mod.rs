//! Audio engine for fmpoly
//!
//! Renders blocks of samples from the shared voice registry. MIDI
//! ingestion, audio output and WAV capture live in the submodules.

mod ingest;
mod midi;
mod player;
mod recorder;

pub use ingest::{apply_message, Applied, IngestStats, Ingestor};
pub use midi::{MidiMessage, MidiSource};
pub use player::Player;
pub use recorder::Recorder;

use std::sync::Arc;

use crate::synth::{FmParams, VoiceRegistry, VoiceSnapshot, MAX_NOTES};

/// The block renderer.
///
/// Owned by the audio callback. Each block it copies the voice list out of
/// the registry, synthesizes outside the lock, then writes the advanced
/// phases back.
pub struct Engine {
    registry: Arc<VoiceRegistry>,
    params: FmParams,
    sample_rate: f64,
    voices: Vec<VoiceSnapshot>,
    mix: Vec<f64>,
}

impl Engine {
    /// Create a new engine rendering from `registry`
    pub fn new(registry: Arc<VoiceRegistry>, params: FmParams, sample_rate: u32) -> Self {
        Self {
            registry,
            params,
            sample_rate: sample_rate as f64,
            voices: Vec::with_capacity(MAX_NOTES),
            mix: Vec::new(),
        }
    }

    /// Create an engine with its mix buffer sized for `frames`, so the
    /// first callbacks do not allocate
    pub fn with_block_size(
        registry: Arc<VoiceRegistry>,
        params: FmParams,
        sample_rate: u32,
        frames: usize,
    ) -> Self {
        let mut engine = Self::new(registry, params, sample_rate);
        engine.mix = vec![0.0; frames];
        engine
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Get the synthesis parameters
    pub fn params(&self) -> &FmParams {
        &self.params
    }

    /// Get the registry this engine renders from
    pub fn registry(&self) -> &Arc<VoiceRegistry> {
        &self.registry
    }

    /// Fill a buffer with the next block of the summed voice output.
    ///
    /// With no voices sounding the block is exactly zero.
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        let frames = buffer.len();
        if self.mix.len() < frames {
            self.mix.resize(frames, 0.0);
        }
        let mix = &mut self.mix[..frames];
        mix.fill(0.0);

        self.registry.snapshot_into(&mut self.voices);
        if self.voices.is_empty() {
            buffer.fill(0.0);
            return;
        }

        for voice in self.voices.iter_mut() {
            voice.phase = self
                .params
                .render(voice.note, voice.phase, self.sample_rate, mix);
        }
        self.registry.commit(&self.voices);

        for (out, sample) in buffer.iter_mut().zip(mix.iter()) {
            *out = *sample as f32;
        }
    }
}
