pub mod espeak;
pub mod neural;

pub use espeak::EspeakBackend;
pub use neural::NeuralBackend;

use crate::error::SynthesisError;
use crate::prosody::Prosody;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Represents a text-to-speech voice
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Voice {
    pub id: String,
    pub label: String,
}

impl Voice {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// The two engines the studio knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Neural,
    Espeak,
}

impl EngineKind {
    pub const ALL: [EngineKind; 2] = [EngineKind::Neural, EngineKind::Espeak];

    pub fn descriptor(self) -> EngineDescriptor {
        match self {
            EngineKind::Neural => EngineDescriptor {
                name: "Neural (online)",
                supports_pitch: true,
            },
            EngineKind::Espeak => EngineDescriptor {
                name: "eSpeak NG (offline)",
                supports_pitch: false,
            },
        }
    }

    /// Parses the `default_engine` setting.
    pub fn from_setting(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "neural" | "online" => Some(EngineKind::Neural),
            "espeak" | "espeak-ng" | "offline" => Some(EngineKind::Espeak),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineDescriptor {
    pub name: &'static str,
    pub supports_pitch: bool,
}

/// One unit of work for a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub prosody: Prosody,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>, prosody: Prosody) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            prosody,
        }
    }

    /// The text a backend should speak, or `EmptyText` if there is none.
    pub fn usable_text(&self) -> Result<&str, SynthesisError> {
        let text = self.text.trim();
        if text.is_empty() {
            Err(SynthesisError::EmptyText)
        } else {
            Ok(text)
        }
    }
}

/// Trait that all speech synthesis backends must implement.
/// This allows the studio to drive an online service and a local synthesizer
/// through the same calls.
#[cfg_attr(test, mockall::automock)]
pub trait SpeechBackend: Send + Sync {
    fn kind(&self) -> EngineKind;

    fn descriptor(&self) -> EngineDescriptor {
        self.kind().descriptor()
    }

    /// Returns a list of supported voices
    fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError>;

    /// Blocks until the clip is fully written and returns its path.
    fn synthesize(&self, request: &SynthesisRequest) -> Result<PathBuf, SynthesisError>;
}

/// Creates a new, empty `tts_<token>.<ext>` file in `dir`.
///
/// The file is created with exclusive-create semantics, so an existing file is
/// never reused even when several generations share the directory.
pub fn fresh_output_file(dir: &Path, extension: &str) -> std::io::Result<(File, PathBuf)> {
    let suffix = format!(".{}", extension);
    tempfile::Builder::new()
        .prefix("tts_")
        .suffix(&suffix)
        .rand_bytes(16)
        .tempfile_in(dir)?
        .keep()
        .map_err(|e| e.error)
}

/// Best-effort removal of a partial clip after a failed synthesis.
pub(crate) fn discard_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        log::debug!("Could not remove partial output {}: {}", path.display(), e);
    }
}
