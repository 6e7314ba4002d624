//! Online neural voices over an SSML REST endpoint.
//!
//! The request format is the one used by Azure-style neural speech services:
//! an SSML document in the body, the desired container in
//! `X-Microsoft-OutputFormat`, and an optional subscription key header.

use super::{discard_partial, fresh_output_file, EngineKind, SpeechBackend, SynthesisRequest, Voice};
use crate::config_loader::Settings;
use crate::error::SynthesisError;
use crate::prosody::{self, NeuralProsody};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Voices offered without asking the service.
pub const PRESET_VOICES: &[(&str, &str)] = &[
    ("ru-RU-SvetlanaNeural", "Svetlana · ru-RU · ♀"),
    ("ru-RU-DmitryNeural", "Dmitry · ru-RU · ♂"),
    ("uk-UA-PolinaNeural", "Polina · uk-UA · ♀"),
    ("uk-UA-OstapNeural", "Ostap · uk-UA · ♂"),
    ("en-US-JennyNeural", "Jenny · en-US · ♀"),
    ("en-US-GuyNeural", "Guy · en-US · ♂"),
    ("en-GB-RyanNeural", "Ryan · en-GB · ♂"),
    ("de-DE-KatjaNeural", "Katja · de-DE · ♀"),
];

pub struct NeuralBackend {
    endpoint: String,
    key: String,
    output_format: String,
    default_voice: String,
    output_dir: PathBuf,
    timeout: Duration,
}

impl NeuralBackend {
    pub fn new(endpoint: &str, output_dir: &Path) -> Self {
        let defaults = Settings::default();
        Self {
            endpoint: endpoint.to_string(),
            key: String::new(),
            output_format: defaults.neural_output_format,
            default_voice: defaults.neural_default_voice,
            output_dir: output_dir.to_path_buf(),
            timeout: Duration::from_secs(defaults.synthesis_timeout_secs),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.neural_endpoint.clone(),
            key: settings.neural_key.clone(),
            output_format: settings.neural_output_format.clone(),
            default_voice: settings.neural_default_voice.clone(),
            output_dir: settings.output_dir(),
            timeout: Duration::from_secs(settings.synthesis_timeout_secs),
        }
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    /// Builds the SSML document for one request. An empty voice id falls back
    /// to the configured default voice; unknown ids are passed through and
    /// left to the service.
    pub fn build_ssml(&self, voice_id: &str, text: &str, prosody: &NeuralProsody) -> String {
        let voice = if voice_id.trim().is_empty() {
            self.default_voice.as_str()
        } else {
            voice_id
        };
        format!(
            "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='{}'>\
             <voice name='{}'><prosody rate='{}' pitch='{}' volume='{}'>{}</prosody></voice></speak>",
            voice_locale(voice),
            escape_xml(voice),
            prosody.rate,
            prosody.pitch,
            prosody.volume,
            escape_xml(text)
        )
    }

    async fn fetch_to_file(&self, ssml: String, file: std::fs::File) -> Result<(), SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("tts-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut request = client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .body(ssml);
        if !self.key.is_empty() {
            request = request.header("Ocp-Apim-Subscription-Key", &self.key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let mut out = tokio::fs::File::from_std(file);
        let mut written = 0usize;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len();
        }
        out.flush().await?;
        out.sync_all().await?;

        if written == 0 {
            return Err(SynthesisError::EmptyAudio);
        }
        Ok(())
    }
}

impl SpeechBackend for NeuralBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Neural
    }

    fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError> {
        Ok(PRESET_VOICES
            .iter()
            .map(|(id, label)| Voice::new(*id, *label))
            .collect())
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<PathBuf, SynthesisError> {
        let text = request.usable_text()?;
        let ssml = self.build_ssml(&request.voice_id, text, &prosody::neural(&request.prosody));
        let (file, path) = fresh_output_file(&self.output_dir, "mp3")?;

        log::info!("Neural: synthesizing {} chars to {}", text.len(), path.display());

        // A private runtime per call; the file handle is closed when the task ends.
        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SynthesisError::Runtime(e.to_string()))
            .and_then(|runtime| runtime.block_on(self.fetch_to_file(ssml, file)));

        match result {
            Ok(()) => Ok(path),
            Err(e) => {
                discard_partial(&path);
                Err(e)
            }
        }
    }
}

/// `ru-RU-SvetlanaNeural` -> `ru-RU`.
fn voice_locale(voice: &str) -> String {
    let parts: Vec<&str> = voice.splitn(3, '-').collect();
    if parts.len() >= 2 && !parts[0].is_empty() && !parts[1].is_empty() {
        format!("{}-{}", parts[0], parts[1])
    } else {
        "en-US".to_string()
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
