//! Real-time audio playback using cpal

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::Engine;
use crate::config::AudioConfig;
use crate::error::SynthError;

/// Real-time audio player.
///
/// The engine is moved into the output callback, which renders one mono
/// block per call and copies it to every device channel.
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    /// Create a stopped player
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start playing audio from the engine on the default output device
    pub fn start(&mut self, engine: Engine, audio: &AudioConfig) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(SynthError::NoOutputDevice)?;

        let default_config = device
            .default_output_config()
            .context("failed to query output device configuration")?;
        let sample_format = default_config.sample_format();
        let stream_config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: SampleRate(audio.sample_rate),
            buffer_size: BufferSize::Fixed(audio.buffer_size as u32),
        };

        info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = audio.sample_rate,
            buffer_size = audio.buffer_size,
            channels = stream_config.channels,
            "starting audio output"
        );

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let block = audio.buffer_size;

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, engine, running, block)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, engine, running, block)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, engine, running, block)?,
            other => {
                self.running.store(false, Ordering::SeqCst);
                return Err(SynthError::UnsupportedSampleFormat(format!("{:?}", other)).into());
            }
        };

        stream.play().context("failed to start audio stream")?;
        self.stream = Some(stream);

        Ok(())
    }

    /// Stop playback. No render calls happen after this returns.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if self.stream.take().is_some() {
            info!("audio output stopped");
        }
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    mut engine: Engine,
    running: Arc<AtomicBool>,
    block: usize,
) -> Result<Stream> {
    let channels = (config.channels as usize).max(1);
    let mut mono = vec![0.0f32; block];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if !running.load(Ordering::SeqCst) {
                // Fill with silence when stopped
                for sample in data.iter_mut() {
                    *sample = T::from_sample(0.0f32);
                }
                return;
            }

            let frames = data.len() / channels;
            if mono.len() < frames {
                // Only when the host hands over a larger block than requested
                mono.resize(frames, 0.0);
            }
            let mono = &mut mono[..frames];
            engine.fill_buffer(mono);

            for (frame, &sample) in data.chunks_mut(channels).zip(mono.iter()) {
                for channel_sample in frame.iter_mut() {
                    *channel_sample = T::from_sample(sample);
                }
            }
        },
        |err| {
            warn!("audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_starts_stopped() {
        let player = Player::new();
        assert!(!player.is_playing());
    }

    #[test]
    fn test_stop_without_start() {
        let mut player = Player::default();
        player.stop();
        assert!(!player.is_playing());
    }
}
