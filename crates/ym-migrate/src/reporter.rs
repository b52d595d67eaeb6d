//! User-facing progress output.
//!
//! The engine never prints directly. Everything meant for the person running
//! migrations goes through a [`Reporter`]; internal diagnostics use `log`.

use std::sync::Mutex;

/// Sink for progress messages.
pub trait Reporter: Send + Sync {
    /// Write one line of progress output.
    fn write(&self, message: &str);

    /// Write a warning. Defaults to a prefixed [`Reporter::write`].
    fn warn(&self, message: &str) {
        self.write(&format!("WARNING: {message}"));
    }
}

/// Forwards messages to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn write(&self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }
}

/// Collects messages in memory.
#[derive(Debug, Default)]
pub struct BufferReporter {
    lines: Mutex<Vec<String>>,
}

impl BufferReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl Reporter for BufferReporter {
    fn write(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(message.to_string());
        }
    }
}
