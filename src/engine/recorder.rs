//! Offline rendering to WAV files

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::Engine;

/// Mono 32-bit float WAV writer
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    frames_written: u64,
}

impl Recorder {
    /// Create `path`, truncating any existing file
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            frames_written: 0,
        })
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Duration written so far in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames_written as f64 / self.sample_rate as f64
    }

    /// Append a block
    pub fn write_buffer(&mut self, buffer: &[f32]) -> Result<()> {
        for &sample in buffer {
            self.writer
                .write_sample(sample)
                .context("failed to write sample")?;
        }
        self.frames_written += buffer.len() as u64;
        Ok(())
    }

    /// Pull `frames` frames out of `engine` in blocks of `block_size` and write them
    pub fn record(&mut self, engine: &mut Engine, frames: u64, block_size: usize) -> Result<()> {
        let mut block = vec![0.0f32; block_size.max(1)];
        let mut remaining = frames;

        while remaining > 0 {
            let n = remaining.min(block.len() as u64) as usize;
            engine.fill_buffer(&mut block[..n]);
            self.write_buffer(&block[..n])?;
            remaining -= n as u64;
        }

        Ok(())
    }

    /// Write the header and close the file
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{FmParams, VoiceRegistry};
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn engine(notes: &[u8]) -> Engine {
        let registry = Arc::new(VoiceRegistry::new());
        for &note in notes {
            registry.insert(note, 0.0);
        }
        Engine::new(registry, FmParams::default(), 44100)
    }

    #[test]
    fn test_recorder_creation() {
        let file = NamedTempFile::new().unwrap();
        let recorder = Recorder::new(file.path(), 44100).unwrap();

        assert_eq!(recorder.frames_written(), 0);
        assert_eq!(recorder.duration_secs(), 0.0);
    }

    #[test]
    fn test_record_partial_last_block() {
        let file = NamedTempFile::new().unwrap();
        let mut recorder = Recorder::new(file.path(), 44100).unwrap();

        recorder.record(&mut engine(&[60]), 1000, 512).unwrap();
        assert_eq!(recorder.frames_written(), 1000);
    }

    #[test]
    fn test_record_duration() {
        let file = NamedTempFile::new().unwrap();
        let mut recorder = Recorder::new(file.path(), 44100).unwrap();

        recorder.record(&mut engine(&[]), 44100, 512).unwrap();
        assert!((recorder.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_recording_matches_engine_output() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        {
            let mut recorder = Recorder::new(&path, 44100).unwrap();
            recorder.record(&mut engine(&[60, 67]), 2048, 300).unwrap();
            recorder.finalize().unwrap();
        }

        let mut expected = vec![0.0f32; 2048];
        engine(&[60, 67]).fill_buffer(&mut expected);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.sample_format, SampleFormat::Float);

        let samples: Vec<f32> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 2048);
        for (a, b) in samples.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_silent_recording() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut recorder = Recorder::new(&path, 48000).unwrap();
        recorder.record(&mut engine(&[]), 4800, 256).unwrap();
        recorder.finalize().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert!(reader.into_samples::<f32>().all(|s| s.unwrap() == 0.0));
    }
}
