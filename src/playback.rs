use crate::error::PlaybackError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

/// In-process audio output.
#[cfg_attr(test, mockall::automock)]
pub trait AudioOutput {
    /// Replaces whatever is playing with `path` and starts it.
    fn load_and_play(&mut self, path: &Path) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    /// True once the current clip has drained, or when nothing is loaded.
    fn is_finished(&self) -> bool;
}

/// The host's "open with default application" mechanism.
#[cfg_attr(test, mockall::automock)]
pub trait ExternalPlayer {
    fn open(&self, path: &Path) -> std::io::Result<()>;
}

pub struct RodioOutput {
    // Audio stream must outlive every sink created from its handle
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl RodioOutput {
    pub fn try_new() -> Result<Self, PlaybackError> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn load_and_play(&mut self, path: &Path) -> Result<(), PlaybackError> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }

        let file = File::open(path).map_err(|source| PlaybackError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Decoder::new(BufReader::new(file))?;
        let sink = Sink::try_new(&self.handle)?;
        sink.append(source);
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().map_or(true, |sink| sink.empty())
    }
}

pub struct SystemOpener;

impl SystemOpener {
    fn command(path: &Path) -> Command {
        #[cfg(target_os = "windows")]
        {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]).arg(path);
            command
        }
        #[cfg(target_os = "macos")]
        {
            let mut command = Command::new("open");
            command.arg(path);
            command
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let mut command = Command::new("xdg-open");
            command.arg(path);
            command
        }
    }
}

impl ExternalPlayer for SystemOpener {
    fn open(&self, path: &Path) -> std::io::Result<()> {
        let mut child = Self::command(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        // Reap the launcher without blocking the caller
        thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Where `play` sent the clip.
#[derive(Debug)]
pub enum PlayRoute {
    Internal,
    /// Handed to the OS. `cause` is the load error that forced the fallback,
    /// `None` when no audio output was available at all.
    External { cause: Option<PlaybackError> },
}

pub struct PlaybackController {
    output: Option<Box<dyn AudioOutput>>,
    external: Box<dyn ExternalPlayer>,
    state: PlaybackState,
}

impl PlaybackController {
    /// Opens the default audio device unless `enable_audio` is off. Without a
    /// device every clip goes to the external player.
    pub fn new(enable_audio: bool) -> Self {
        let output: Option<Box<dyn AudioOutput>> = if enable_audio {
            match RodioOutput::try_new() {
                Ok(output) => Some(Box::new(output)),
                Err(e) => {
                    log::warn!("Audio output unavailable, using external player: {}", e);
                    None
                }
            }
        } else {
            log::info!("In-process audio disabled, using external player");
            None
        };
        Self::with_parts(output, Box::new(SystemOpener))
    }

    pub fn with_parts(
        output: Option<Box<dyn AudioOutput>>,
        external: Box<dyn ExternalPlayer>,
    ) -> Self {
        Self {
            output,
            external,
            state: PlaybackState::Stopped,
        }
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    pub fn state(&self) -> PlaybackState {
        match (&self.output, self.state) {
            (Some(output), PlaybackState::Playing) if output.is_finished() => {
                PlaybackState::Stopped
            }
            _ => self.state,
        }
    }

    pub fn play(&mut self, path: &Path) -> Result<PlayRoute, PlaybackError> {
        let cause = match self.output.as_mut() {
            Some(output) => match output.load_and_play(path) {
                Ok(()) => {
                    self.state = PlaybackState::Playing;
                    return Ok(PlayRoute::Internal);
                }
                Err(e) => {
                    log::warn!("Playback failed, opening external player: {}", e);
                    Some(e)
                }
            },
            None => None,
        };

        self.state = PlaybackState::Stopped;
        self.external.open(path).map_err(PlaybackError::Launch)?;
        log::info!("Opened {} in external player", path.display());
        Ok(PlayRoute::External { cause })
    }

    /// Toggles between playing and paused. No-op without an audio output.
    pub fn pause(&mut self) -> PlaybackState {
        let current = self.state();
        let Some(output) = self.output.as_mut() else {
            return current;
        };
        self.state = match current {
            PlaybackState::Playing => {
                output.pause();
                PlaybackState::Paused
            }
            PlaybackState::Paused => {
                output.resume();
                PlaybackState::Playing
            }
            PlaybackState::Stopped => PlaybackState::Stopped,
        };
        self.state
    }

    pub fn stop(&mut self) -> PlaybackState {
        if let Some(output) = self.output.as_mut() {
            output.stop();
            self.state = PlaybackState::Stopped;
        }
        self.state
    }
}
