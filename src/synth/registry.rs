//! Shared registry of sounding voices
//!
//! Written by the MIDI ingestion thread (insert/remove) and by the audio
//! callback (phase updates). Every operation takes the lock exactly once,
//! so no caller ever sees a half-applied change.
//!
//! The render path uses [`VoiceRegistry::snapshot_into`] and
//! [`VoiceRegistry::commit`] so that only bookkeeping happens under the
//! lock. A commit only touches voices whose generation still matches the
//! snapshot, so a note released and struck again mid-block starts from its
//! fresh phase rather than inheriting the old one.

use parking_lot::Mutex;
use std::collections::HashMap;

use super::voice::{Voice, VoiceSnapshot};

/// Number of distinct MIDI notes, and so the most voices that can sound at once
pub const MAX_NOTES: usize = 128;

#[derive(Debug, Default)]
struct Inner {
    voices: HashMap<u8, Voice>,
    next_generation: u64,
}

/// Mapping from MIDI note number to voice state
#[derive(Debug)]
pub struct VoiceRegistry {
    inner: Mutex<Inner>,
}

impl VoiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                voices: HashMap::with_capacity(MAX_NOTES),
                next_generation: 0,
            }),
        }
    }

    /// Add a voice, replacing any voice already sounding on `note`
    pub fn insert(&self, note: u8, phase: f64) {
        let mut inner = self.inner.lock();
        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.voices.insert(note, Voice { phase, generation });
    }

    /// Remove the voice on `note`. Returns false if none was sounding.
    pub fn remove(&self, note: u8) -> bool {
        self.inner.lock().voices.remove(&note).is_some()
    }

    /// Replace every voice's phase with `f(note, phase)` under a single lock
    pub fn for_each_mut<F>(&self, mut f: F)
    where
        F: FnMut(u8, f64) -> f64,
    {
        let mut inner = self.inner.lock();
        for (&note, voice) in inner.voices.iter_mut() {
            voice.phase = f(note, voice.phase);
        }
    }

    /// Copy all voices into `out`, replacing its contents.
    ///
    /// `out` should have capacity for [`MAX_NOTES`] so this never allocates.
    pub fn snapshot_into(&self, out: &mut Vec<VoiceSnapshot>) {
        out.clear();
        let inner = self.inner.lock();
        out.extend(inner.voices.iter().map(|(&note, voice)| VoiceSnapshot {
            note,
            phase: voice.phase,
            generation: voice.generation,
        }));
    }

    /// Write back phases from a snapshot.
    ///
    /// Entries that were removed, or replaced by a newer insert, since the
    /// snapshot was taken are left alone.
    pub fn commit(&self, snapshot: &[VoiceSnapshot]) {
        let mut inner = self.inner.lock();
        for entry in snapshot {
            if let Some(voice) = inner.voices.get_mut(&entry.note) {
                if voice.generation == entry.generation {
                    voice.phase = entry.phase;
                }
            }
        }
    }

    /// Current phase of the voice on `note`
    pub fn phase(&self, note: u8) -> Option<f64> {
        self.inner.lock().voices.get(&note).map(|v| v.phase)
    }

    /// Check whether `note` is sounding
    pub fn contains(&self, note: u8) -> bool {
        self.inner.lock().voices.contains_key(&note)
    }

    /// Sounding notes in ascending order
    pub fn notes(&self) -> Vec<u8> {
        let mut notes: Vec<u8> = self.inner.lock().voices.keys().copied().collect();
        notes.sort_unstable();
        notes
    }

    /// Number of sounding voices
    pub fn len(&self) -> usize {
        self.inner.lock().voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Silence everything
    pub fn clear(&self) {
        self.inner.lock().voices.clear();
    }
}

impl Default for VoiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
