/// The interactive front end. Every call happens on the thread that owns the
/// shell; the studio never calls it from a worker.
#[cfg_attr(test, mockall::automock)]
pub trait Shell {
    /// Engine picker, voice picker, sliders, text box, generate button.
    fn set_inputs_enabled(&mut self, enabled: bool);

    /// Play, pause, stop and save.
    fn set_playback_enabled(&mut self, enabled: bool);

    fn set_status(&mut self, status: &str);

    fn show_error(&mut self, message: &str);
}

/// A shell that remembers what it was told. Handy for headless callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingShell {
    pub inputs_enabled: bool,
    pub playback_enabled: bool,
    pub status: String,
    pub errors: Vec<String>,
}

impl Default for RecordingShell {
    fn default() -> Self {
        Self {
            inputs_enabled: true,
            playback_enabled: false,
            status: "Ready".to_string(),
            errors: Vec::new(),
        }
    }
}

impl Shell for RecordingShell {
    fn set_inputs_enabled(&mut self, enabled: bool) {
        self.inputs_enabled = enabled;
    }

    fn set_playback_enabled(&mut self, enabled: bool) {
        self.playback_enabled = enabled;
    }

    fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
