//! # fretsense - live note tracking in the terminal
//!
//! Thin host around `fretsense-core`: captures live audio on a dedicated
//! worker thread, runs the per-frame analysis pipeline, and prints each
//! stable note (or drum hit) event as it is emitted.
//!
//! ## Architecture
//! - **Audio thread**: capture + analysis, one block per frame
//! - **Main thread**: prints stable events
//! - **Communication**: crossbeam channels for thread-safe data exchange
//!
//! ## Usage
//! ```text
//! fretsense-cli [guitar|bass|voice|drums]
//! fretsense-cli --config profile.json
//! fretsense-cli --write-config profile.json [mode]
//! ```

use anyhow::{Context, Result};
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, Sender};
use fretsense_core::{audio, AnalyzerConfig, DrumAnalyzer, DrumClass, Note, NoteAnalyzer};
use std::fs::File;
use std::io::{Read, Write};
use std::thread;

/// Which analysis policy the worker runs.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Melodic,
    Percussive,
}

/// A display-ready event from the audio worker.
#[derive(Debug, Clone)]
enum DisplayEvent {
    StableNote { note: Note, cents: f32, clarity: f32 },
    DrumHit { class: DrumClass },
}

fn main() -> Result<()> {
    let (config, mode) = parse_args()?;
    config.validate()?;

    eprintln!("[MAIN] Starting fretsense ({:?} mode)...", mode);

    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);

    let worker = thread::spawn(move || {
        audio_worker(config, mode, event_tx, shutdown_rx);
    });

    // Print events until the worker goes away (device failure or process
    // termination). Ctrl-C simply kills the process; the capture stream
    // holds no resources that need explicit teardown.
    while let Ok(event) = event_rx.recv() {
        match event {
            DisplayEvent::StableNote { note, cents, clarity } => {
                println!("{:<4} {:+6.1} cents  clarity {:.2}", note.to_string(), cents, clarity);
            }
            DisplayEvent::DrumHit { class } => {
                println!("{:<8} ({})", class.to_string(), class.display_note());
            }
        }
    }

    drop(shutdown_tx);
    worker
        .join()
        .map_err(|_| anyhow::anyhow!("audio worker panicked"))?;
    Ok(())
}

/// Capture-and-analyze loop, run on its own thread.
///
/// Owns the cpal stream and the analyzer; sends at most one display
/// event per captured block.
fn audio_worker(
    config: AnalyzerConfig,
    mode: Mode,
    event_tx: Sender<DisplayEvent>,
    shutdown_rx: Receiver<()>,
) {
    eprintln!("[AUDIO-THREAD] Starting audio thread...");
    let (raw_tx, raw_rx) = crossbeam_channel::unbounded::<Vec<f32>>();

    let (stream, sample_rate) = match audio::start_capture(raw_tx, audio::BLOCK_SIZE) {
        Ok(tuple) => tuple,
        Err(e) => {
            eprintln!("[AUDIO-THREAD] Fatal error starting audio: {}", e);
            return;
        }
    };

    // Constructors only fail on invalid configs, and main validated ours.
    let mut note_analyzer = match mode {
        Mode::Melodic => Some(NoteAnalyzer::new(config.clone()).expect("validated config")),
        Mode::Percussive => None,
    };
    let mut drum_analyzer = match mode {
        Mode::Percussive => Some(DrumAnalyzer::new(config).expect("validated config")),
        Mode::Melodic => None,
    };

    eprintln!("[AUDIO-THREAD] Entering processing loop...");
    loop {
        crossbeam_channel::select! {
            recv(raw_rx) -> msg => match msg {
                Ok(block) => {
                    let event = match mode {
                        Mode::Melodic => {
                            let analyzer = note_analyzer.as_mut().unwrap();
                            let result = analyzer.process_frame(&block, sample_rate);
                            result.stable_note.map(|note| DisplayEvent::StableNote {
                                note,
                                cents: result.cents_deviation.unwrap_or(0.0),
                                clarity: result.clarity.unwrap_or(0.0),
                            })
                        }
                        Mode::Percussive => {
                            let analyzer = drum_analyzer.as_mut().unwrap();
                            analyzer
                                .process_frame(&block, sample_rate)
                                .map(|class| DisplayEvent::DrumHit { class })
                        }
                    };
                    if let Some(event) = event {
                        if event_tx.send(event).is_err() {
                            eprintln!("[AUDIO-THREAD] Display channel closed");
                            break;
                        }
                    }
                }
                Err(_) => {
                    eprintln!("[AUDIO-THREAD] Audio channel closed");
                    break;
                }
            },
            recv(shutdown_rx) -> _ => {
                eprintln!("[AUDIO-THREAD] Received shutdown signal");
                break;
            }
        }
    }

    eprintln!("[AUDIO-THREAD] Stopping stream and exiting...");
    if let Err(e) = stream.pause() {
        eprintln!("[AUDIO-THREAD] Error pausing stream: {}", e);
    }
    drop(stream);
}

/// Parses the command line into a config and an analysis mode.
fn parse_args() -> Result<(AnalyzerConfig, Mode)> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut mode_name = "guitar".to_string();
    let mut config_path: Option<String> = None;
    let mut write_path: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                config_path = Some(
                    args.get(i + 1)
                        .context("--config requires a file path")?
                        .clone(),
                );
                i += 2;
            }
            "--write-config" => {
                write_path = Some(
                    args.get(i + 1)
                        .context("--write-config requires a file path")?
                        .clone(),
                );
                i += 2;
            }
            name => {
                mode_name = name.to_string();
                i += 1;
            }
        }
    }

    let (preset, mode) = match mode_name.as_str() {
        "guitar" => (AnalyzerConfig::guitar(), Mode::Melodic),
        "bass" => (AnalyzerConfig::bass(), Mode::Melodic),
        "voice" => (AnalyzerConfig::voice(), Mode::Melodic),
        "drums" => (AnalyzerConfig::drums(), Mode::Percussive),
        other => anyhow::bail!(
            "unknown mode '{}' (expected guitar, bass, voice, or drums)",
            other
        ),
    };

    if let Some(path) = write_path {
        save_config(&preset, &path)?;
        eprintln!("[MAIN] Wrote {} preset to {}", mode_name, path);
        std::process::exit(0);
    }

    let config = match config_path {
        Some(path) => load_config(&path)?,
        None => preset,
    };

    Ok((config, mode))
}

/// Saves an analyzer config to a JSON file.
fn save_config(config: &AnalyzerConfig, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

/// Loads an analyzer config from a JSON file.
fn load_config(path: &str) -> Result<AnalyzerConfig> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path))?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let config: AnalyzerConfig =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path))?;
    Ok(config)
}
