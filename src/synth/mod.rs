//! FM voice synthesis
//!
//! Contains the note-to-frequency mapping, the FM voice model and the
//! shared voice registry.

mod fm;
mod pitch;
mod registry;
mod voice;

pub use fm::FmParams;
pub use pitch::{note_to_freq, A4_FREQ, A4_NOTE};
pub use registry::{VoiceRegistry, MAX_NOTES};
pub use voice::{Voice, VoiceSnapshot};
