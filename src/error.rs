//! Error types for fmpoly

use thiserror::Error;

/// Domain errors surfaced by setup paths (config, devices, ports).
///
/// The render path never produces one of these.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("no MIDI input ports available")]
    NoMidiPorts,

    #[error("MIDI port '{0}' not found")]
    MidiPortNotFound(String),

    #[error("MIDI error: {0}")]
    Midi(String),
}
