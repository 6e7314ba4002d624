//! The surface a UI shell drives: pick an engine and voice, generate, play,
//! save.

use crate::backends::{
    EngineDescriptor, EngineKind, EspeakBackend, NeuralBackend, SpeechBackend, SynthesisRequest,
    Voice,
};
use crate::catalog::VoiceCatalog;
use crate::config_loader::Settings;
use crate::coordinator::{GenerationCoordinator, GenerationOutcome, GenerationState};
use crate::error::{GenerateError, PlaybackError, SaveError};
use crate::playback::{PlayRoute, PlaybackController, PlaybackState};
use crate::prosody::Prosody;
use crate::shell::Shell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Studio {
    engines: Vec<Arc<dyn SpeechBackend>>,
    selected: EngineKind,
    voices: Vec<Voice>,
    preferred_voice: String,
    coordinator: GenerationCoordinator,
    playback: PlaybackController,
    last_output: Option<PathBuf>,
}

impl Studio {
    pub fn from_settings(settings: &Settings) -> Self {
        let neural: Arc<dyn SpeechBackend> = Arc::new(NeuralBackend::from_settings(settings));
        let espeak: Arc<dyn SpeechBackend> = Arc::new(EspeakBackend::from_settings(settings));
        Self::with_parts(
            vec![neural, espeak],
            startup_engine(settings),
            &settings.preferred_voice,
            PlaybackController::new(settings.enable_audio),
        )
    }

    pub fn with_parts(
        engines: Vec<Arc<dyn SpeechBackend>>,
        selected: EngineKind,
        preferred_voice: &str,
        playback: PlaybackController,
    ) -> Self {
        let mut studio = Self {
            engines,
            selected,
            voices: Vec::new(),
            preferred_voice: preferred_voice.to_string(),
            coordinator: GenerationCoordinator::new(),
            playback,
            last_output: None,
        };
        studio.select_engine(selected);
        studio
    }

    pub fn engines(&self) -> Vec<EngineDescriptor> {
        self.engines.iter().map(|e| e.descriptor()).collect()
    }

    pub fn selected_engine(&self) -> EngineKind {
        self.selected
    }

    fn backend(&self, kind: EngineKind) -> Option<Arc<dyn SpeechBackend>> {
        self.engines.iter().find(|e| e.kind() == kind).cloned()
    }

    /// Switches engines and refreshes the voice list. The shell should grey
    /// out the pitch slider when the descriptor says pitch is unsupported.
    pub fn select_engine(&mut self, kind: EngineKind) -> &[Voice] {
        self.selected = kind;
        self.voices = match self.backend(kind) {
            Some(backend) => VoiceCatalog::list(backend.as_ref()),
            None => {
                log::warn!("No backend registered for {:?}", kind);
                vec![VoiceCatalog::placeholder()]
            }
        };
        &self.voices
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn default_voice(&self) -> Option<&Voice> {
        VoiceCatalog::default_voice(&self.voices, &self.preferred_voice)
    }

    pub fn generation_state(&self) -> GenerationState {
        self.coordinator.state()
    }

    /// Starts a generation with the selected engine. Blank text is reported
    /// to the shell without starting a worker.
    pub fn generate(
        &mut self,
        text: &str,
        voice_id: &str,
        prosody: Prosody,
        shell: &mut dyn Shell,
    ) -> Result<bool, GenerateError> {
        if text.trim().is_empty() {
            shell.show_error("Enter some text first");
            return Ok(false);
        }
        let Some(backend) = self.backend(self.selected) else {
            shell.show_error("Selected engine is not available");
            return Ok(false);
        };

        let request = SynthesisRequest::new(text.trim(), voice_id, prosody);
        self.coordinator.generate(backend, request, shell)?;
        Ok(true)
    }

    /// Call from the shell's idle tick.
    pub fn poll(&mut self, shell: &mut dyn Shell) -> Option<GenerationOutcome> {
        let outcome = self.coordinator.poll(shell)?;
        self.record(&outcome);
        Some(outcome)
    }

    /// Blocks until the current generation settles.
    pub fn wait(&mut self, shell: &mut dyn Shell) -> Option<GenerationOutcome> {
        let outcome = self.coordinator.wait(shell)?;
        self.record(&outcome);
        Some(outcome)
    }

    fn record(&mut self, outcome: &GenerationOutcome) {
        if let GenerationOutcome::Done(path) = outcome {
            if self.playback.state() != PlaybackState::Stopped {
                self.playback.stop();
            }
            self.last_output = Some(path.clone());
        }
    }

    pub fn last_output(&self) -> Option<&Path> {
        self.last_output.as_deref()
    }

    fn playable(&self) -> Option<PathBuf> {
        self.last_output.as_ref().filter(|p| p.exists()).cloned()
    }

    /// `None` when there is nothing to play.
    pub fn play(&mut self) -> Option<Result<PlayRoute, PlaybackError>> {
        let path = self.playable()?;
        Some(self.playback.play(&path))
    }

    pub fn pause(&mut self) -> Option<PlaybackState> {
        self.last_output.as_ref()?;
        Some(self.playback.pause())
    }

    pub fn stop(&mut self) -> Option<PlaybackState> {
        self.last_output.as_ref()?;
        Some(self.playback.stop())
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// File name to pre-fill a save dialog with, e.g. `tts.mp3`.
    pub fn suggested_file_name(&self) -> Option<String> {
        let ext = self.last_output.as_ref()?.extension()?;
        Some(format!("tts.{}", ext.to_string_lossy()))
    }

    /// Copies the last clip to `dest` byte for byte. A destination without an
    /// extension gets the clip's extension. The clip itself is left in place,
    /// and `dest` may not be the clip.
    pub fn save_as(&self, dest: &Path) -> Result<PathBuf, SaveError> {
        let source = self.last_output.as_ref().ok_or(SaveError::NothingGenerated)?;
        if !source.exists() {
            return Err(SaveError::SourceMissing(source.clone()));
        }

        let mut dest = dest.to_path_buf();
        if dest.extension().is_none() {
            if let Some(ext) = source.extension() {
                dest.set_extension(ext);
            }
        }

        if dest.exists() && std::fs::canonicalize(&dest)? == std::fs::canonicalize(source)? {
            return Err(SaveError::SameFile(dest));
        }

        std::fs::copy(source, &dest)?;
        log::info!("Saved {} to {}", source.display(), dest.display());
        Ok(dest)
    }
}

/// Host of the subscription-keyed neural service.
const KEYED_SERVICE_HOST: &str = ".speech.microsoft.com";

/// Engine selected at startup. Falls back to eSpeak NG when the keyed neural
/// service has no key configured.
fn startup_engine(settings: &Settings) -> EngineKind {
    let configured = EngineKind::from_setting(&settings.default_engine).unwrap_or_else(|| {
        log::warn!("Unknown default_engine '{}', using neural", settings.default_engine);
        EngineKind::Neural
    });

    if configured == EngineKind::Neural
        && settings.neural_key.trim().is_empty()
        && settings.neural_endpoint.contains(KEYED_SERVICE_HOST)
    {
        log::warn!(
            "No neural_key set for {}, starting with eSpeak NG",
            settings.neural_endpoint
        );
        return EngineKind::Espeak;
    }
    configured
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockSpeechBackend;
    use crate::playback::MockExternalPlayer;
    use crate::shell::RecordingShell;
    use tempfile::tempdir;

    fn backend(kind: EngineKind, voices: Vec<Voice>) -> MockSpeechBackend {
        let mut mock = MockSpeechBackend::new();
        mock.expect_kind().return_const(kind);
        mock.expect_descriptor().return_const(kind.descriptor());
        mock.expect_list_voices().returning(move || Ok(voices.clone()));
        mock
    }

    fn studio(neural: MockSpeechBackend, espeak: MockSpeechBackend) -> Studio {
        let mut opener = MockExternalPlayer::new();
        opener.expect_open().returning(|_| Ok(()));
        let neural: Arc<dyn SpeechBackend> = Arc::new(neural);
        let espeak: Arc<dyn SpeechBackend> = Arc::new(espeak);
        Studio::with_parts(
            vec![neural, espeak],
            EngineKind::Neural,
            "ru-RU",
            PlaybackController::with_parts(None, Box::new(opener)),
        )
    }

    #[test]
    fn test_save_before_generation_is_rejected() {
        let studio = studio(
            backend(EngineKind::Neural, vec![]),
            backend(EngineKind::Espeak, vec![]),
        );
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.mp3");

        assert!(matches!(studio.save_as(&dest), Err(SaveError::NothingGenerated)));
        assert!(!dest.exists());
        assert!(studio.suggested_file_name().is_none());
    }

    #[test]
    fn test_select_engine_refreshes_voices() {
        let mut studio = studio(
            backend(
                EngineKind::Neural,
                vec![
                    Voice::new("en-US-GuyNeural", "Guy"),
                    Voice::new("ru-RU-DmitryNeural", "Dmitry"),
                ],
            ),
            backend(EngineKind::Espeak, vec![]),
        );
        assert_eq!(studio.voices().len(), 2);
        assert_eq!(studio.default_voice().unwrap().id, "ru-RU-DmitryNeural");

        let voices = studio.select_engine(EngineKind::Espeak);
        assert_eq!(voices, &[VoiceCatalog::placeholder()]);
        assert_eq!(studio.selected_engine(), EngineKind::Espeak);
        assert_eq!(studio.engines().len(), 2);
    }

    #[test]
    fn test_blank_text_does_not_start_worker() {
        let mut studio = studio(
            backend(EngineKind::Neural, vec![]),
            backend(EngineKind::Espeak, vec![]),
        );
        let mut shell = RecordingShell::default();

        let started = studio.generate("   ", "", Prosody::default(), &mut shell).unwrap();
        assert!(!started);
        assert_eq!(studio.generation_state(), GenerationState::Idle);
        assert_eq!(shell.errors.len(), 1);
        assert!(shell.inputs_enabled);
    }

    #[test]
    fn test_generate_then_save_and_play() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("tts_clip.wav");
        std::fs::write(&clip, b"RIFFdata").unwrap();

        let mut neural = backend(EngineKind::Neural, vec![]);
        let produced = clip.clone();
        neural
            .expect_synthesize()
            .times(1)
            .returning(move |_| Ok(produced.clone()));

        let mut studio = studio(neural, backend(EngineKind::Espeak, vec![]));
        let mut shell = RecordingShell::default();

        assert!(studio.play().is_none());
        assert!(studio.generate("Hello", "", Prosody::default(), &mut shell).unwrap());
        assert!(matches!(studio.wait(&mut shell), Some(GenerationOutcome::Done(_))));
        assert_eq!(studio.last_output(), Some(clip.as_path()));
        assert_eq!(studio.suggested_file_name().as_deref(), Some("tts.wav"));

        let saved = studio.save_as(&dir.path().join("keep")).unwrap();
        assert_eq!(saved, dir.path().join("keep.wav"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"RIFFdata");
        assert!(clip.exists());

        let route = studio.play().unwrap().unwrap();
        assert!(matches!(route, PlayRoute::External { cause: None }));
    }

    #[test]
    fn test_save_reports_missing_source() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("tts_gone.mp3");

        let mut neural = backend(EngineKind::Neural, vec![]);
        let produced = gone.clone();
        neural.expect_synthesize().returning(move |_| Ok(produced.clone()));

        let mut studio = studio(neural, backend(EngineKind::Espeak, vec![]));
        let mut shell = RecordingShell::default();
        studio.generate("Hi", "", Prosody::default(), &mut shell).unwrap();
        studio.wait(&mut shell);

        assert!(matches!(
            studio.save_as(&dir.path().join("out.mp3")),
            Err(SaveError::SourceMissing(_))
        ));
        assert!(studio.play().is_none());
    }

    #[test]
    fn test_save_onto_the_clip_itself_is_rejected() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("tts_self.mp3");
        std::fs::write(&clip, b"ID3-real-audio").unwrap();

        let mut neural = backend(EngineKind::Neural, vec![]);
        let produced = clip.clone();
        neural.expect_synthesize().returning(move |_| Ok(produced.clone()));

        let mut studio = studio(neural, backend(EngineKind::Espeak, vec![]));
        let mut shell = RecordingShell::default();
        studio.generate("Hi", "", Prosody::default(), &mut shell).unwrap();
        studio.wait(&mut shell);

        assert!(matches!(studio.save_as(&clip), Err(SaveError::SameFile(_))));
        // Extension is appended before the comparison
        assert!(matches!(
            studio.save_as(&dir.path().join("tts_self")),
            Err(SaveError::SameFile(_))
        ));
        // Same file through a different spelling of the path
        let dotted = dir.path().join(".").join("tts_self.mp3");
        assert!(matches!(studio.save_as(&dotted), Err(SaveError::SameFile(_))));

        assert_eq!(std::fs::read(&clip).unwrap(), b"ID3-real-audio");
    }

    #[test]
    fn test_keyless_azure_starts_offline() {
        let settings = Settings::default();
        assert!(settings.neural_key.is_empty());
        assert_eq!(startup_engine(&settings), EngineKind::Espeak);

        let unknown = Settings {
            default_engine: "festival".to_string(),
            ..Settings::default()
        };
        assert_eq!(startup_engine(&unknown), EngineKind::Espeak);
    }

    #[test]
    fn test_neural_kept_when_usable() {
        let keyed = Settings {
            neural_key: "secret".to_string(),
            ..Settings::default()
        };
        assert_eq!(startup_engine(&keyed), EngineKind::Neural);

        let local_proxy = Settings {
            neural_endpoint: "http://127.0.0.1:5500/tts".to_string(),
            ..Settings::default()
        };
        assert_eq!(startup_engine(&local_proxy), EngineKind::Neural);

        let offline = Settings {
            default_engine: "espeak".to_string(),
            neural_key: "secret".to_string(),
            ..Settings::default()
        };
        assert_eq!(startup_engine(&offline), EngineKind::Espeak);
    }
}
