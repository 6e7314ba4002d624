//! Background generation.
//!
//! `generate` hands one request to a short-lived worker thread and returns
//! immediately. The worker only sends its result over a channel; the shell's
//! idle tick calls `poll`, which applies the outcome to the shell on the
//! interactive thread.

use crate::backends::{SpeechBackend, SynthesisRequest};
use crate::error::GenerateError;
use crate::shell::Shell;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const STATUS_GENERATING: &str = "Generating audio...";
const WORKER_LOST: &str = "generation worker stopped unexpectedly";

type WorkerResult = Result<PathBuf, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating,
}

/// How a generation ended. Applying it to the shell returns the coordinator
/// to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Done(PathBuf),
    Failed(String),
}

struct Pending {
    rx: Receiver<WorkerResult>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct GenerationCoordinator {
    pending: Option<Pending>,
}

impl GenerationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GenerationState {
        if self.pending.is_some() {
            GenerationState::Generating
        } else {
            GenerationState::Idle
        }
    }

    /// Starts synthesis on a worker thread. Inputs and playback are disabled
    /// until the outcome is applied by `poll` or `wait`.
    pub fn generate(
        &mut self,
        backend: Arc<dyn SpeechBackend>,
        request: SynthesisRequest,
        shell: &mut dyn Shell,
    ) -> Result<(), GenerateError> {
        if self.pending.is_some() {
            return Err(GenerateError::Busy);
        }

        shell.set_inputs_enabled(false);
        shell.set_playback_enabled(false);
        shell.set_status(STATUS_GENERATING);

        let (tx, rx) = channel::<WorkerResult>();
        let spawned = thread::Builder::new()
            .name("tts-generate".to_string())
            .spawn(move || {
                let result = backend.synthesize(&request).map_err(|e| e.to_string());
                let _ = tx.send(result);
            });

        match spawned {
            Ok(handle) => {
                self.pending = Some(Pending { rx, handle });
                Ok(())
            }
            Err(e) => {
                shell.set_inputs_enabled(true);
                shell.set_status("Ready");
                Err(GenerateError::Spawn(e))
            }
        }
    }

    /// Non-blocking check for the worker's result.
    pub fn poll(&mut self, shell: &mut dyn Shell) -> Option<GenerationOutcome> {
        let received = match self.pending.as_ref()?.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(WORKER_LOST.to_string()),
        };
        Some(self.finish(received, shell))
    }

    /// Blocks until the running generation ends. `None` when idle.
    pub fn wait(&mut self, shell: &mut dyn Shell) -> Option<GenerationOutcome> {
        let received = self
            .pending
            .as_ref()?
            .rx
            .recv()
            .unwrap_or_else(|_| Err(WORKER_LOST.to_string()));
        Some(self.finish(received, shell))
    }

    fn finish(&mut self, received: WorkerResult, shell: &mut dyn Shell) -> GenerationOutcome {
        if let Some(pending) = self.pending.take() {
            if pending.handle.join().is_err() {
                log::error!("Generation worker panicked");
            }
        }

        shell.set_inputs_enabled(true);
        match received {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                log::info!("Generated {}", path.display());
                shell.set_playback_enabled(true);
                shell.set_status(&format!("Done: {}", name));
                GenerationOutcome::Done(path)
            }
            Err(message) => {
                log::error!("Synthesis failed: {}", message);
                shell.set_playback_enabled(false);
                shell.set_status(&format!("Error: {}", message));
                shell.show_error(&format!("Synthesis failed:\n{}", message));
                GenerationOutcome::Failed(message)
            }
        }
    }
}
