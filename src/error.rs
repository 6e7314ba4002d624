use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a speech backend while producing a clip.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("Nothing to synthesize: text is empty")]
    EmptyText,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Speech service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Speech service returned no audio")]
    EmptyAudio,

    #[error("{program} failed: {stderr}")]
    Subprocess { program: String, stderr: String },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("Produced audio is unreadable: {0}")]
    InvalidAudio(#[from] hound::Error),

    #[error("Async runtime error: {0}")]
    Runtime(String),
}

/// Failures of the in-process player or of the external fallback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("No audio output device: {0}")]
    NoOutputDevice(#[from] rodio::StreamError),

    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),

    #[error("Cannot create audio sink: {0}")]
    Sink(#[from] rodio::PlayError),

    #[error("Cannot launch external player: {0}")]
    Launch(std::io::Error),
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("No generated audio to save")]
    NothingGenerated,

    #[error("Generated audio {0} no longer exists")]
    SourceMissing(PathBuf),

    #[error("{0} is the generated clip itself")]
    SameFile(PathBuf),

    #[error("Failed to save file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("A generation is already in progress")]
    Busy,

    #[error("Failed to start generation worker: {0}")]
    Spawn(std::io::Error),
}
