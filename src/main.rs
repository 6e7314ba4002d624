//! tts-studio - terminal front end for the speech studio core
//!
//! Generates clips with the neural (online) or eSpeak NG (offline) engine,
//! then optionally saves and plays them.

use clap::{Parser, Subcommand, ValueEnum};
use std::error::Error;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tts_studio::backends::EngineKind;
use tts_studio::config_loader::{self, Settings};
use tts_studio::coordinator::GenerationOutcome;
use tts_studio::playback::{PlayRoute, PlaybackState};
use tts_studio::prosody::Prosody;
use tts_studio::shell::Shell;
use tts_studio::studio::Studio;

const IDLE_TICK: Duration = Duration::from_millis(50);

/// Text-to-speech studio
#[derive(Parser)]
#[command(name = "tts-studio")]
#[command(author = "StarTuz")]
#[command(version)]
#[command(
    about = "Generate, play and save speech with neural or eSpeak NG voices",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineArg {
    /// Online neural voices
    Neural,
    /// Offline eSpeak NG
    Espeak,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Neural => EngineKind::Neural,
            EngineArg::Espeak => EngineKind::Espeak,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List available engines
    Engines,

    /// List voices of an engine
    Voices {
        /// Engine to query (defaults to the configured engine)
        #[arg(short, long, value_enum)]
        engine: Option<EngineArg>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Synthesize text
    Speak {
        /// Text to speak
        text: String,
        #[arg(short, long, value_enum)]
        engine: Option<EngineArg>,
        /// Voice id (see `voices`); defaults to the preferred voice
        #[arg(short, long)]
        voice: Option<String>,
        /// Rate, -50..50
        #[arg(long, default_value_t = 0, allow_negative_numbers = true,
              value_parser = clap::value_parser!(i32).range(-50..=50))]
        rate: i32,
        /// Pitch in Hz, -12..12 (neural only)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true,
              value_parser = clap::value_parser!(i32).range(-12..=12))]
        pitch: i32,
        /// Volume, -50..50
        #[arg(long, default_value_t = 0, allow_negative_numbers = true,
              value_parser = clap::value_parser!(i32).range(-50..=50))]
        volume: i32,
        /// Copy the clip here
        #[arg(short, long)]
        save: Option<PathBuf>,
        /// Play the clip when done
        #[arg(short, long)]
        play: bool,
    },
}

/// Reports shell updates on the terminal.
struct ConsoleShell;

impl Shell for ConsoleShell {
    fn set_inputs_enabled(&mut self, enabled: bool) {
        log::debug!("inputs {}", if enabled { "enabled" } else { "disabled" });
    }

    fn set_playback_enabled(&mut self, enabled: bool) {
        log::debug!("playback {}", if enabled { "enabled" } else { "disabled" });
    }

    fn set_status(&mut self, status: &str) {
        log::info!("{}", status);
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings: Settings = config_loader::SETTINGS
        .read()
        .map(|s| s.clone())
        .unwrap_or_default();

    match cli.command {
        Commands::Engines => {
            for kind in EngineKind::ALL {
                let descriptor = kind.descriptor();
                println!(
                    "{:<22} pitch: {}",
                    descriptor.name,
                    if descriptor.supports_pitch { "yes" } else { "no" }
                );
            }
        }

        Commands::Voices { engine, json } => {
            let mut studio = Studio::from_settings(&Settings {
                enable_audio: false,
                ..settings
            });
            if let Some(engine) = engine {
                studio.select_engine(engine.into());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(studio.voices())?);
            } else {
                for voice in studio.voices() {
                    println!("{:<28} {}", voice.id, voice.label);
                }
            }
        }

        Commands::Speak {
            text,
            engine,
            voice,
            rate,
            pitch,
            volume,
            save,
            play,
        } => {
            let enable_audio = play && settings.enable_audio;
            let mut studio = Studio::from_settings(&Settings {
                enable_audio,
                ..settings
            });
            if let Some(engine) = engine {
                studio.select_engine(engine.into());
            }

            let kind = studio.selected_engine();
            if pitch != 0 && !kind.descriptor().supports_pitch {
                log::warn!("{} has no pitch control; --pitch ignored", kind.descriptor().name);
            }

            let voice_id = voice
                .or_else(|| studio.default_voice().map(|v| v.id.clone()))
                .unwrap_or_default();

            let mut shell = ConsoleShell;
            if !studio.generate(&text, &voice_id, Prosody::new(rate, pitch, volume), &mut shell)? {
                return Err("nothing to synthesize".into());
            }

            let outcome = loop {
                if let Some(outcome) = studio.poll(&mut shell) {
                    break outcome;
                }
                thread::sleep(IDLE_TICK);
            };

            let path = match outcome {
                GenerationOutcome::Done(path) => path,
                GenerationOutcome::Failed(message) => return Err(message.into()),
            };
            println!("{}", path.display());

            if let Some(dest) = save {
                let saved = studio.save_as(&dest)?;
                println!("Saved to {}", saved.display());
            }

            if play {
                match studio.play() {
                    Some(Ok(PlayRoute::Internal)) => {
                        while studio.playback_state() == PlaybackState::Playing {
                            thread::sleep(IDLE_TICK);
                        }
                    }
                    Some(Ok(PlayRoute::External { cause })) => {
                        if let Some(cause) = cause {
                            eprintln!("Player error: {}. Opened external player.", cause);
                        }
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => {}
                }
            }
        }
    }

    Ok(())
}
