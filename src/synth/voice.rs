//! Per-note voice state

/// One sounding note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    /// Modulator phase in radians, unwrapped
    pub phase: f64,
    /// Insertion stamp, unique per registry
    pub generation: u64,
}

/// A voice copied out of the registry for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSnapshot {
    pub note: u8,
    pub phase: f64,
    pub generation: u64,
}
