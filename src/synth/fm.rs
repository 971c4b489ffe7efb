//! Two-oscillator FM voice model
//!
//! A single modulator perturbs the phase of a single carrier. Both run at
//! fixed ratios of the note frequency.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use super::pitch::note_to_freq;

/// Synthesis parameters, fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FmParams {
    /// Carrier frequency as a multiple of the note frequency (default: 1.0)
    #[serde(default = "default_carrier_ratio")]
    pub carrier_ratio: f64,

    /// Modulator frequency as a multiple of the note frequency (default: 2.0)
    #[serde(default = "default_modulator_ratio")]
    pub modulator_ratio: f64,

    /// Depth of the modulator's phase deviation on the carrier (default: 5.0)
    #[serde(default = "default_modulation_index")]
    pub modulation_index: f64,

    /// Per-voice output gain (default: 0.1)
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
}

fn default_carrier_ratio() -> f64 { 1.0 }
fn default_modulator_ratio() -> f64 { 2.0 }
fn default_modulation_index() -> f64 { 5.0 }
fn default_amplitude() -> f64 { 0.1 }

impl Default for FmParams {
    fn default() -> Self {
        Self {
            carrier_ratio: default_carrier_ratio(),
            modulator_ratio: default_modulator_ratio(),
            modulation_index: default_modulation_index(),
            amplitude: default_amplitude(),
        }
    }
}

impl FmParams {
    /// Render one voice into `out`, accumulating on top of what is there.
    ///
    /// `phase` is the modulator phase at the first sample of the block.
    /// Returns the modulator phase at the first sample of the next block.
    pub fn render(&self, note: u8, phase: f64, sample_rate: f64, out: &mut [f64]) -> f64 {
        let freq = note_to_freq(note);
        let modulator_step = TAU * freq * self.modulator_ratio / sample_rate;
        let carrier_step = TAU * freq * self.carrier_ratio / sample_rate;
        let carrier_phase = self.carrier_phase(phase);

        for (i, sample) in out.iter_mut().enumerate() {
            let t = i as f64;
            let modulator = (modulator_step * t + phase).sin();
            let carrier = (carrier_step * t + carrier_phase + self.modulation_index * modulator).sin();
            *sample += carrier * self.amplitude;
        }

        phase + modulator_step * out.len() as f64
    }

    /// Carrier phase locked to the modulator phase by ratio
    fn carrier_phase(&self, modulator_phase: f64) -> f64 {
        if self.modulator_ratio == 0.0 {
            return 0.0;
        }
        modulator_phase * self.carrier_ratio / self.modulator_ratio
    }
}
