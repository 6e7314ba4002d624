//! # tts-studio
//!
//! Core of a speech studio: one interface over an online neural voice service
//! and the local eSpeak NG synthesizer, slider-to-engine prosody mapping,
//! background generation that keeps the front end responsive, and playback
//! with a fallback to the system's default player.
//!
//! ```no_run
//! use tts_studio::config_loader::Settings;
//! use tts_studio::prosody::Prosody;
//! use tts_studio::shell::RecordingShell;
//! use tts_studio::studio::Studio;
//!
//! let settings = Settings::new()?;
//! let mut studio = Studio::from_settings(&settings);
//! let voice = studio.default_voice().map(|v| v.id.clone()).unwrap_or_default();
//!
//! let mut shell = RecordingShell::default();
//! studio.generate("Hello there", &voice, Prosody::new(10, 0, 0), &mut shell)?;
//! studio.wait(&mut shell);
//! studio.save_as(std::path::Path::new("hello.mp3"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backends;
pub mod catalog;
pub mod config_loader;
pub mod coordinator;
pub mod error;
pub mod playback;
pub mod prosody;
pub mod shell;
pub mod studio;
