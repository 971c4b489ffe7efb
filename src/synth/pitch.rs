//! MIDI note to frequency conversion

/// MIDI note number of A4
pub const A4_NOTE: u8 = 69;

/// Frequency of A4 in Hz
pub const A4_FREQ: f64 = 440.0;

/// Convert a MIDI note number to its equal-tempered frequency in Hz
pub fn note_to_freq(note: u8) -> f64 {
    A4_FREQ * 2f64.powf((note as f64 - A4_NOTE as f64) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4() {
        assert_eq!(note_to_freq(69), 440.0);
    }

    #[test]
    fn test_octaves() {
        assert!((note_to_freq(81) - 880.0).abs() < 1e-9);
        assert!((note_to_freq(57) - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_middle_c() {
        assert!((note_to_freq(60) - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn test_range_is_finite_and_increasing() {
        let mut last = 0.0;
        for note in 0..=127u8 {
            let freq = note_to_freq(note);
            assert!(freq.is_finite());
            assert!(freq > last);
            last = freq;
        }
    }
}
