use config::{Config, File};
use lazy_static::lazy_static;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub default_engine: String, // "neural" or "espeak"
    pub preferred_voice: String,
    // Neural (online) engine
    pub neural_endpoint: String,
    pub neural_key: String,
    pub neural_output_format: String,
    pub neural_default_voice: String,
    // eSpeak NG (offline) engine
    pub espeak_binary: String,
    pub synthesis_timeout_secs: u64,
    pub output_dir: String, // empty = platform temp dir
    pub enable_audio: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_engine: "neural".to_string(),
            preferred_voice: "ru-RU".to_string(),
            neural_endpoint: "https://eastus.tts.speech.microsoft.com/cognitiveservices/v1"
                .to_string(),
            neural_key: String::new(),
            neural_output_format: "audio-24khz-48kbitrate-mono-mp3".to_string(),
            neural_default_voice: "ru-RU-SvetlanaNeural".to_string(),
            espeak_binary: "espeak-ng".to_string(),
            synthesis_timeout_secs: 60,
            output_dir: String::new(),
            enable_audio: true,
        }
    }
}

lazy_static! {
    pub static ref SETTINGS: RwLock<Settings> = RwLock::new(Settings::new().unwrap_or_else(|e| {
        log::warn!("Falling back to default settings: {}", e);
        Settings::default()
    }));
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let defaults = Settings::default();
        let builder = Config::builder()
            .set_default("default_engine", defaults.default_engine)?
            .set_default("preferred_voice", defaults.preferred_voice)?
            .set_default("neural_endpoint", defaults.neural_endpoint)?
            .set_default("neural_key", defaults.neural_key)?
            .set_default("neural_output_format", defaults.neural_output_format)?
            .set_default("neural_default_voice", defaults.neural_default_voice)?
            .set_default("espeak_binary", defaults.espeak_binary)?
            .set_default("synthesis_timeout_secs", defaults.synthesis_timeout_secs)?
            .set_default("output_dir", defaults.output_dir)?
            .set_default("enable_audio", defaults.enable_audio)?
            // Merge with local config file (if exists)
            .add_source(File::with_name("TtsStudio").required(false))
            .add_source(
                File::with_name(
                    &dirs::config_dir()
                        .unwrap_or_else(|| PathBuf::from("."))
                        .join("tts-studio/TtsStudio")
                        .to_string_lossy(),
                )
                .required(false),
            )
            // Merge with environment variables (e.g. TTS_STUDIO_ESPEAK_BINARY)
            .add_source(config::Environment::with_prefix("TTS_STUDIO"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.synthesis_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "synthesis_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.espeak_binary.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "espeak_binary cannot be empty".to_string(),
            ));
        }
        if !(self.neural_endpoint.starts_with("http://")
            || self.neural_endpoint.starts_with("https://"))
        {
            return Err(config::ConfigError::Message(format!(
                "Invalid neural_endpoint: {}. Must be an http(s) URL",
                self.neural_endpoint
            )));
        }
        Ok(())
    }

    /// Directory generated clips are written to.
    pub fn output_dir(&self) -> PathBuf {
        if self.output_dir.trim().is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.output_dir)
        }
    }
}
