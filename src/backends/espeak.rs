use super::{discard_partial, fresh_output_file, EngineKind, SpeechBackend, SynthesisRequest, Voice};
use crate::config_loader::Settings;
use crate::error::SynthesisError;
use crate::prosody::{self, EspeakProsody};

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

pub struct EspeakBackend {
    binary_path: String,
    output_dir: PathBuf,
    timeout: Duration,
    voices: OnceLock<Vec<Voice>>,
}

impl EspeakBackend {
    pub fn new(binary_path: &str, output_dir: &Path, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.to_string(),
            output_dir: output_dir.to_path_buf(),
            timeout,
            voices: OnceLock::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.espeak_binary,
            &settings.output_dir(),
            Duration::from_secs(settings.synthesis_timeout_secs),
        )
    }

    fn query_voices(&self) -> Result<Vec<Voice>, SynthesisError> {
        let output = Command::new(&self.binary_path)
            .arg("--voices")
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(SynthesisError::Subprocess {
                program: self.binary_path.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_voice_list(&output.stdout))
    }

    /// The voice to pass with `-v`, or `None` to keep the engine default.
    fn select_voice<'a>(&self, voice_id: &'a str) -> Option<&'a str> {
        if voice_id.is_empty() {
            return None;
        }
        match self.list_voices() {
            Ok(voices) if voices.iter().any(|v| v.id == voice_id) => Some(voice_id),
            Ok(_) => {
                log::warn!("eSpeak: voice '{}' not installed, using default", voice_id);
                None
            }
            Err(e) => {
                log::warn!("eSpeak: cannot verify voice '{}' ({}), using default", voice_id, e);
                None
            }
        }
    }

    /// Command line for one render. Pitch never appears here.
    pub fn command_args(
        &self,
        mapped: &EspeakProsody,
        voice: Option<&str>,
        out: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-s".into(),
            mapped.rate.to_string().into(),
            "-a".into(),
            mapped.amplitude().to_string().into(),
        ];
        if let Some(voice) = voice {
            args.push("-v".into());
            args.push(voice.into());
        }
        args.push("-w".into());
        args.push(out.as_os_str().to_owned());
        args.push("--stdin".into());
        args
    }

    fn render(&self, args: &[OsString], text: &str) -> Result<(), SynthesisError> {
        log::debug!("eSpeak: {} {:?}", self.binary_path, args);

        let mut child = Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from its own thread so a child that stops reading cannot
        // block us past the timeout
        let stdin = child.stdin.take();
        let payload = format!("{}\n", text);
        let writer = thread::spawn(move || -> io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(payload.as_bytes())?;
            }
            Ok(())
        });

        let waited = child.wait_timeout(self.timeout);
        if !matches!(waited, Ok(Some(_))) {
            let _ = child.kill();
            let _ = child.wait();
        }
        let fed = writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked")));

        match waited? {
            Some(status) if status.success() => {
                fed?;
                Ok(())
            }
            Some(_) => {
                if let Err(e) = fed {
                    log::debug!("eSpeak: stdin closed early: {}", e);
                }
                let mut stderr = String::new();
                if let Some(mut pipe) = child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr);
                }
                Err(SynthesisError::Subprocess {
                    program: self.binary_path.clone(),
                    stderr: stderr.trim().to_string(),
                })
            }
            None => Err(SynthesisError::Timeout {
                program: self.binary_path.clone(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

impl SpeechBackend for EspeakBackend {
    fn kind(&self) -> EngineKind {
        EngineKind::Espeak
    }

    /// Queries `espeak-ng --voices` on first use; later calls reuse the result.
    fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError> {
        if let Some(voices) = self.voices.get() {
            return Ok(voices.clone());
        }
        let voices = self.query_voices()?;
        log::info!("eSpeak: found {} voices", voices.len());
        Ok(self.voices.get_or_init(|| voices).clone())
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<PathBuf, SynthesisError> {
        let text = request.usable_text()?;
        let mapped = prosody::espeak(&request.prosody);
        let voice = self.select_voice(&request.voice_id);

        let (file, path) = fresh_output_file(&self.output_dir, "wav")?;
        drop(file);

        log::info!("eSpeak: synthesizing {} chars to {}", text.len(), path.display());

        let args = self.command_args(&mapped, voice, &path);
        let result = self
            .render(&args, text)
            .and_then(|_| Ok(hound::WavReader::open(&path)?.duration()));

        match result {
            Ok(samples) => {
                log::debug!("eSpeak: wrote {} samples", samples);
                Ok(path)
            }
            Err(e) => {
                discard_partial(&path);
                Err(e)
            }
        }
    }
}

/// Parses the table printed by `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
///
/// The file column is the voice id. Language tags that are not valid UTF-8
/// are skipped.
pub fn parse_voice_list(stdout: &[u8]) -> Vec<Voice> {
    let mut voices: Vec<Voice> = Vec::new();

    for line in stdout.split(|b| *b == b'\n') {
        let fields: Vec<&[u8]> = line
            .split(|b| b.is_ascii_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() < 5 || fields[0] == b"Pty" {
            continue;
        }

        let id = match std::str::from_utf8(fields[4]) {
            Ok(id) => id.to_string(),
            Err(_) => continue,
        };
        if voices.iter().any(|v| v.id == id) {
            continue;
        }

        let name = String::from_utf8_lossy(fields[3]).replace('_', " ");

        let mut tags: Vec<&str> = Vec::new();
        let other = fields[5..]
            .iter()
            .filter_map(|f| f.strip_prefix(b"("));
        for raw in std::iter::once(fields[1]).chain(other) {
            if let Ok(tag) = std::str::from_utf8(raw) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }

        let label = if tags.is_empty() {
            name
        } else {
            format!("{} · {}", name, tags.join(","))
        };
        voices.push(Voice { id, label });
    }

    voices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prosody::Prosody;

    const SAMPLE: &[u8] = b"Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
 5  ru              --/M      Russian            zle/ru
";

    #[test]
    fn test_parse_voice_list() {
        let voices = parse_voice_list(SAMPLE);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0], Voice::new("gmw/af", "Afrikaans · af"));
        assert_eq!(voices[1], Voice::new("gmw/en-US", "English (America) · en-us,en"));
        assert_eq!(voices[2].id, "zle/ru");
    }

    #[test]
    fn test_undecodable_tags_are_skipped() {
        let mut line = b" 5  ".to_vec();
        line.extend_from_slice(&[0xff, 0xfe]);
        line.extend_from_slice(b"  --/F  Mystery  misc/mystery  (de 5)\n");
        let voices = parse_voice_list(&line);
        assert_eq!(voices, vec![Voice::new("misc/mystery", "Mystery · de")]);
    }

    #[test]
    fn test_empty_output_has_no_voices() {
        let header = b"Pty Language Age/Gender VoiceName File Other Languages\n";
        assert!(parse_voice_list(header).is_empty());
    }

    #[test]
    fn test_command_args_ignore_pitch() {
        let backend = EspeakBackend::new("espeak-ng", Path::new("/tmp"), Duration::from_secs(5));
        let out = Path::new("/tmp/tts_x.wav");
        let low = backend.command_args(&prosody::espeak(&Prosody::new(10, -12, 0)), None, out);
        let high = backend.command_args(&prosody::espeak(&Prosody::new(10, 12, 0)), None, out);
        assert_eq!(low, high);

        let expected: Vec<OsString> = ["-s", "240", "-a", "50", "-w", "/tmp/tts_x.wav", "--stdin"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(low, expected);
    }

    #[test]
    fn test_missing_binary_fails_listing() {
        let backend = EspeakBackend::new(
            "/nonexistent/espeak-ng",
            &std::env::temp_dir(),
            Duration::from_secs(5),
        );
        assert!(backend.list_voices().is_err());
    }
}
