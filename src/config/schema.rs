//! Configuration schema definitions

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::SynthError;
use crate::synth::FmParams;

/// Main configuration for fmpoly
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// MIDI input settings
    #[serde(default)]
    pub midi: MidiConfig,

    /// FM voice parameters
    #[serde(default)]
    pub fm: FmParams,
}

impl SynthConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate audio settings
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            return invalid("sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            return invalid("buffer size must be between 64 and 8192");
        }

        // Validate MIDI settings
        if let Some(channel) = self.midi.channel {
            if channel > 15 {
                return invalid("MIDI channel must be between 0 and 15");
            }
        }

        // Validate FM parameters
        let fm = &self.fm;
        if !(fm.carrier_ratio.is_finite() && fm.carrier_ratio > 0.0) {
            return invalid("carrier ratio must be a positive number");
        }
        if !(fm.modulator_ratio.is_finite() && fm.modulator_ratio > 0.0) {
            return invalid("modulator ratio must be a positive number");
        }
        if !(fm.modulation_index.is_finite() && fm.modulation_index >= 0.0) {
            return invalid("modulation index must be zero or positive");
        }
        if !(fm.amplitude.is_finite() && fm.amplitude > 0.0 && fm.amplitude <= 1.0) {
            return invalid("amplitude must be in (0.0, 1.0]");
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> Result<()> {
    Err(SynthError::InvalidConfig(reason.to_string()).into())
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Frames per callback (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_sample_rate() -> u32 { 44100 }
fn default_buffer_size() -> usize { 512 }

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
        }
    }
}

/// MIDI input configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MidiConfig {
    /// Input port name, matched as a substring (None = first port)
    pub port: Option<String>,

    /// Only react to this channel, 0-15 (None = all channels)
    pub channel: Option<u8>,
}
