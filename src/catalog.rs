use crate::backends::{SpeechBackend, Voice};

pub const NO_VOICES_LABEL: &str = "no voices found";

pub struct VoiceCatalog;

impl VoiceCatalog {
    /// Voices of `backend` for the picker. Never empty: a failed or empty
    /// listing yields a single placeholder with an empty id.
    pub fn list(backend: &dyn SpeechBackend) -> Vec<Voice> {
        let voices = match backend.list_voices() {
            Ok(voices) => voices,
            Err(e) => {
                log::warn!("Voice list unavailable for {}: {}", backend.descriptor().name, e);
                Vec::new()
            }
        };

        if voices.is_empty() {
            vec![Self::placeholder()]
        } else {
            voices
        }
    }

    pub fn placeholder() -> Voice {
        Voice::new("", NO_VOICES_LABEL)
    }

    /// First voice whose id or label mentions `preferred`, else the first one.
    pub fn default_voice<'a>(voices: &'a [Voice], preferred: &str) -> Option<&'a Voice> {
        let preferred = preferred.trim();
        if !preferred.is_empty() {
            if let Some(voice) = voices
                .iter()
                .find(|v| v.id.contains(preferred) || v.label.contains(preferred))
            {
                return Some(voice);
            }
        }
        voices.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{EngineKind, MockSpeechBackend};
    use crate::error::SynthesisError;

    fn backend_with(result: fn() -> Result<Vec<Voice>, SynthesisError>) -> MockSpeechBackend {
        let mut backend = MockSpeechBackend::new();
        backend.expect_list_voices().returning(move || result());
        backend.expect_kind().return_const(EngineKind::Espeak);
        backend
            .expect_descriptor()
            .return_const(EngineKind::Espeak.descriptor());
        backend
    }

    #[test]
    fn test_empty_listing_yields_placeholder() {
        let backend = backend_with(|| Ok(Vec::new()));
        let voices = VoiceCatalog::list(&backend);
        assert_eq!(voices, vec![Voice::new("", NO_VOICES_LABEL)]);
    }

    #[test]
    fn test_failed_listing_yields_placeholder() {
        let backend = backend_with(|| Err(SynthesisError::EmptyAudio));
        let voices = VoiceCatalog::list(&backend);
        assert_eq!(voices.len(), 1);
        assert!(voices[0].id.is_empty());
    }

    #[test]
    fn test_listing_passes_through() {
        let backend = backend_with(|| Ok(vec![Voice::new("a", "A"), Voice::new("b", "B")]));
        assert_eq!(VoiceCatalog::list(&backend).len(), 2);
    }

    #[test]
    fn test_default_voice_prefers_token() {
        let voices = vec![
            Voice::new("en-US-GuyNeural", "Guy · en-US · ♂"),
            Voice::new("ru-RU-DmitryNeural", "Dmitry · ru-RU · ♂"),
        ];
        assert_eq!(VoiceCatalog::default_voice(&voices, "ru-RU").unwrap().id, "ru-RU-DmitryNeural");
        assert_eq!(VoiceCatalog::default_voice(&voices, "fr-FR").unwrap().id, "en-US-GuyNeural");
        assert_eq!(VoiceCatalog::default_voice(&voices, "").unwrap().id, "en-US-GuyNeural");
        assert!(VoiceCatalog::default_voice(&[], "ru-RU").is_none());
    }
}
