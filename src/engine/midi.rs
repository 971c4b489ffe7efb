//! MIDI input for fmpoly.
//!
//! Decodes raw MIDI bytes and forwards them from the platform MIDI thread
//! into a channel consumed by the ingestion loop.

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver};
use midir::{Ignore, MidiInput, MidiInputConnection};
use tracing::info;

use crate::config::MidiConfig;
use crate::error::SynthError;

/// MIDI message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note on: channel (0-15), note (0-127), velocity (0-127)
    NoteOn(u8, u8, u8),
    /// Note off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff(u8, u8, u8),
    /// Control change: channel (0-15), controller (0-127), value (0-127)
    ControlChange(u8, u8, u8),
    /// Program change: channel (0-15), program (0-127)
    ProgramChange(u8, u8),
    /// Pitch bend: channel (0-15), value (0-16383, center at 8192)
    PitchBend(u8, u16),
    /// Any other channel message (aftertouch etc.): status byte
    Other(u8),
}

impl MidiMessage {
    /// Decode raw MIDI bytes. System messages and empty packets yield None.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let status_byte = *data.first()?;

        // Data byte without status, or system message (0xF0-0xFF)
        if status_byte < 0x80 || status_byte >= 0xF0 {
            return None;
        }

        let ch = status_byte & 0x0F;
        let data1 = data.get(1).copied().unwrap_or(0) & 0x7F;
        let data2 = data.get(2).copied().unwrap_or(0) & 0x7F;

        let msg = match status_byte & 0xF0 {
            0x90 => MidiMessage::NoteOn(ch, data1, data2),
            0x80 => MidiMessage::NoteOff(ch, data1, data2),
            0xB0 => MidiMessage::ControlChange(ch, data1, data2),
            0xC0 => MidiMessage::ProgramChange(ch, data1),
            0xE0 => MidiMessage::PitchBend(ch, ((data2 as u16) << 7) | data1 as u16),
            _ => MidiMessage::Other(status_byte),
        };

        Some(msg)
    }

    /// Channel the message was sent on
    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOn(ch, ..)
            | MidiMessage::NoteOff(ch, ..)
            | MidiMessage::ControlChange(ch, ..)
            | MidiMessage::ProgramChange(ch, _)
            | MidiMessage::PitchBend(ch, _) => ch,
            MidiMessage::Other(status) => status & 0x0F,
        }
    }
}

/// A live connection to a MIDI input port.
///
/// Incoming messages are sent to the receiver returned by
/// [`MidiSource::connect`]. Dropping the source closes the port, which
/// disconnects that receiver.
pub struct MidiSource {
    connection: MidiInputConnection<()>,
    port_name: String,
}

impl MidiSource {
    /// Connect to the configured input port (or the first one available).
    pub fn connect(config: &MidiConfig) -> Result<(Self, Receiver<MidiMessage>)> {
        let mut midi_in =
            MidiInput::new("fmpoly").map_err(|e| SynthError::Midi(e.to_string()))?;
        midi_in.ignore(Ignore::All);

        let ports = midi_in.ports();
        if ports.is_empty() {
            return Err(SynthError::NoMidiPorts.into());
        }

        let port = match config.port.as_deref() {
            Some(name) => ports
                .iter()
                .find(|p| {
                    midi_in
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| SynthError::MidiPortNotFound(name.to_string()))?
                .clone(),
            None => ports[0].clone(),
        };

        let port_name = midi_in
            .port_name(&port)
            .map_err(|e| SynthError::Midi(e.to_string()))?;

        let (sender, receiver) = unbounded();
        let connection = midi_in
            .connect(
                &port,
                "fmpoly-input",
                move |_timestamp_us, data, _| {
                    if let Some(msg) = MidiMessage::parse(data) {
                        // Receiver gone means ingestion has stopped
                        let _ = sender.send(msg);
                    }
                },
                (),
            )
            .map_err(|e| SynthError::Midi(e.to_string()))?;

        info!(port = %port_name, "connected to MIDI input");

        Ok((
            Self {
                connection,
                port_name,
            },
            receiver,
        ))
    }

    /// Name of the connected port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Close the port
    pub fn close(self) {
        let _ = self.connection.close();
        info!(port = %self.port_name, "closed MIDI input");
    }
}
