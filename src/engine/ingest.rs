//! MIDI event ingestion
//!
//! Runs on its own thread, blocking on the MIDI channel and turning note
//! messages into registry inserts and removals. It never touches audio.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

use super::midi::MidiMessage;
use crate::synth::VoiceRegistry;

/// Outcome of applying one message to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A voice was started (or restarted) on this note
    NoteOn(u8),
    /// The voice on this note was released, if it was sounding
    NoteOff(u8),
    /// Not a note message, or filtered out by channel
    Ignored,
}

/// Counters gathered over the lifetime of an ingestion thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub note_ons: u64,
    pub note_offs: u64,
    pub ignored: u64,
}

impl IngestStats {
    fn record(&mut self, applied: Applied) {
        match applied {
            Applied::NoteOn(_) => self.note_ons += 1,
            Applied::NoteOff(_) => self.note_offs += 1,
            Applied::Ignored => self.ignored += 1,
        }
    }
}

/// Apply a MIDI message to the registry.
///
/// Note on with non-zero velocity starts a voice at phase 0. Note off, or
/// note on with zero velocity, removes it. Everything else is ignored, as
/// is any message not on `channel` when a channel filter is set.
pub fn apply_message(registry: &VoiceRegistry, msg: &MidiMessage, channel: Option<u8>) -> Applied {
    if channel.is_some_and(|ch| ch != msg.channel()) {
        return Applied::Ignored;
    }

    match *msg {
        MidiMessage::NoteOn(_, note, velocity) if velocity > 0 => {
            registry.insert(note, 0.0);
            Applied::NoteOn(note)
        }
        MidiMessage::NoteOn(_, note, _) | MidiMessage::NoteOff(_, note, _) => {
            registry.remove(note);
            Applied::NoteOff(note)
        }
        _ => Applied::Ignored,
    }
}

/// Handle to a running ingestion thread
pub struct Ingestor {
    stop: Sender<()>,
    handle: JoinHandle<IngestStats>,
}

impl Ingestor {
    /// Start consuming `events` on a new thread.
    ///
    /// The thread ends when [`Ingestor::stop`] is called or when the sender
    /// side of `events` is dropped. Voices still sounding at that point are
    /// left in the registry.
    pub fn spawn(
        registry: Arc<VoiceRegistry>,
        events: Receiver<MidiMessage>,
        channel: Option<u8>,
    ) -> Result<Self> {
        let (stop, stop_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("fmpoly-ingest".to_string())
            .spawn(move || run(&registry, &events, &stop_rx, channel))
            .context("failed to spawn MIDI ingestion thread")?;

        Ok(Self { stop, handle })
    }

    /// Check whether the thread has exited on its own
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the thread and wait for it
    pub fn stop(self) -> IngestStats {
        let _ = self.stop.try_send(());
        // The loop body cannot panic, so a join error only means the
        // thread was torn down externally
        self.handle.join().unwrap_or_default()
    }
}

fn run(
    registry: &VoiceRegistry,
    events: &Receiver<MidiMessage>,
    stop: &Receiver<()>,
    channel: Option<u8>,
) -> IngestStats {
    let mut stats = IngestStats::default();

    loop {
        select! {
            recv(events) -> msg => match msg {
                Ok(msg) => {
                    let applied = apply_message(registry, &msg, channel);
                    debug!(?msg, ?applied, "midi event");
                    stats.record(applied);
                }
                Err(_) => {
                    info!("MIDI source closed, ingestion finished");
                    break;
                }
            },
            recv(stop) -> _ => {
                info!("ingestion stopped");
                break;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::{Duration, Instant};

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_note_on_inserts_at_zero_phase() {
        let registry = VoiceRegistry::new();
        let applied = apply_message(&registry, &MidiMessage::NoteOn(0, 60, 100), None);
        assert_eq!(applied, Applied::NoteOn(60));
        assert_eq!(registry.phase(60), Some(0.0));
    }

    #[test]
    fn test_note_on_zero_velocity_removes() {
        let registry = VoiceRegistry::new();
        registry.insert(60, 4.0);
        let applied = apply_message(&registry, &MidiMessage::NoteOn(0, 60, 0), None);
        assert_eq!(applied, Applied::NoteOff(60));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_note_off_removes() {
        let registry = VoiceRegistry::new();
        registry.insert(62, 0.0);
        apply_message(&registry, &MidiMessage::NoteOff(0, 62, 64), None);
        assert!(!registry.contains(62));
    }

    #[test]
    fn test_note_off_for_silent_note() {
        let registry = VoiceRegistry::new();
        registry.insert(70, 1.0);
        apply_message(&registry, &MidiMessage::NoteOff(0, 62, 0), None);
        assert_eq!(registry.notes(), vec![70]);
    }

    #[test]
    fn test_other_messages_ignored() {
        let registry = VoiceRegistry::new();
        for msg in [
            MidiMessage::ControlChange(0, 1, 64),
            MidiMessage::ProgramChange(0, 3),
            MidiMessage::PitchBend(0, 8192),
            MidiMessage::Other(0xD0),
        ] {
            assert_eq!(apply_message(&registry, &msg, None), Applied::Ignored);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_channel_filter() {
        let registry = VoiceRegistry::new();
        let applied = apply_message(&registry, &MidiMessage::NoteOn(3, 60, 90), Some(0));
        assert_eq!(applied, Applied::Ignored);
        assert!(registry.is_empty());

        apply_message(&registry, &MidiMessage::NoteOn(0, 60, 90), Some(0));
        assert!(registry.contains(60));
    }

    #[test]
    fn test_thread_applies_events_and_stops() {
        let registry = Arc::new(VoiceRegistry::new());
        let (tx, rx) = unbounded();
        let ingestor = Ingestor::spawn(registry.clone(), rx, None).unwrap();

        tx.send(MidiMessage::NoteOn(0, 60, 100)).unwrap();
        tx.send(MidiMessage::NoteOn(0, 64, 100)).unwrap();
        tx.send(MidiMessage::NoteOff(0, 60, 0)).unwrap();
        tx.send(MidiMessage::ControlChange(0, 7, 100)).unwrap();
        wait_until(|| registry.notes() == vec![64]);
        wait_until(|| tx.is_empty());

        let stats = ingestor.stop();
        assert_eq!(
            stats,
            IngestStats {
                note_ons: 2,
                note_offs: 1,
                ignored: 1,
            }
        );
    }

    #[test]
    fn test_source_close_ends_ingestion_and_keeps_voices() {
        let registry = Arc::new(VoiceRegistry::new());
        let (tx, rx) = unbounded();
        let ingestor = Ingestor::spawn(registry.clone(), rx, None).unwrap();

        tx.send(MidiMessage::NoteOn(0, 67, 100)).unwrap();
        drop(tx);

        wait_until(|| ingestor.is_finished());
        assert!(registry.contains(67));
        assert_eq!(ingestor.stop().note_ons, 1);
    }
}
