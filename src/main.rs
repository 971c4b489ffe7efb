//! fmpoly - Real-time polyphonic FM synthesizer

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::bounded;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn, Level};

use fmpoly::config::{self, SynthConfig};
use fmpoly::engine::{Engine, Ingestor, MidiSource, Player, Recorder};
use fmpoly::synth::VoiceRegistry;
use fmpoly::SynthError;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    match cli.command {
        Commands::Play { config: config_path, port } => {
            let mut cfg = config::load_or_default(config_path.as_deref())?;
            if port.is_some() {
                cfg.midi.port = port;
            }
            play(cfg)?;
        }

        Commands::Render {
            config: config_path,
            notes,
            duration,
            output,
        } => {
            let cfg = config::load_or_default(config_path.as_deref())?;
            render(&cfg, &notes, duration, &output)?;
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                    println!("  Buffer size: {}", cfg.audio.buffer_size);
                    println!("  MIDI port: {}", cfg.midi.port.as_deref().unwrap_or("(first available)"));
                    match cfg.midi.channel {
                        Some(ch) => println!("  MIDI channel: {}", ch),
                        None => println!("  MIDI channel: all"),
                    }
                    println!("  Carrier ratio: {}", cfg.fm.carrier_ratio);
                    println!("  Modulator ratio: {}", cfg.fm.modulator_ratio);
                    println!("  Modulation index: {}", cfg.fm.modulation_index);
                    println!("  Voice amplitude: {}", cfg.fm.amplitude);
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../fmpoly.example.yaml");

            let path = "fmpoly.yaml";
            if Path::new(path).exists() {
                println!("fmpoly.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, example_config)?;
                println!("Created fmpoly.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

/// Run the live synthesizer until Ctrl-C
fn play(cfg: SynthConfig) -> Result<()> {
    let registry = Arc::new(VoiceRegistry::new());

    let engine = Engine::with_block_size(
        registry.clone(),
        cfg.fm,
        cfg.audio.sample_rate,
        cfg.audio.buffer_size,
    );
    let mut player = Player::new();
    player.start(engine, &cfg.audio)?;

    // With no MIDI ports the stream still runs, rendering silence
    let midi = match MidiSource::connect(&cfg.midi) {
        Ok((source, events)) => {
            let ingestor = Ingestor::spawn(registry.clone(), events, cfg.midi.channel)?;
            Some((source, ingestor))
        }
        Err(e) if matches!(e.downcast_ref::<SynthError>(), Some(SynthError::NoMidiPorts)) => {
            warn!("no MIDI input ports available, running without input");
            None
        }
        Err(e) => return Err(e),
    };

    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("failed to install Ctrl-C handler")?;

    info!("fmpoly running. Press Ctrl-C to stop.");
    let _ = shutdown_rx.recv();

    // Sink stops before ingestion
    player.stop();
    if let Some((source, ingestor)) = midi {
        let stats = ingestor.stop();
        source.close();
        info!(
            note_ons = stats.note_ons,
            note_offs = stats.note_offs,
            ignored = stats.ignored,
            "MIDI ingestion summary"
        );
    }
    info!("synth stopped");

    Ok(())
}

/// Render `notes` held for `duration` seconds into a WAV file
fn render(cfg: &SynthConfig, notes: &[u8], duration: f64, output: &Path) -> Result<()> {
    if !(duration.is_finite() && duration > 0.0) {
        anyhow::bail!("duration must be a positive number of seconds");
    }

    let registry = Arc::new(VoiceRegistry::new());
    for &note in notes {
        registry.insert(note, 0.0);
    }

    let sample_rate = cfg.audio.sample_rate;
    let mut engine = Engine::new(registry, cfg.fm, sample_rate);
    let frames = (sample_rate as f64 * duration).round() as u64;

    info!(?notes, duration, output = ?output, "rendering");

    let mut recorder = Recorder::new(output, sample_rate)?;
    recorder.record(&mut engine, frames, cfg.audio.buffer_size)?;
    let secs = recorder.duration_secs();
    recorder.finalize()?;

    println!("Rendered {:.2}s to {:?}", secs, output);
    Ok(())
}
