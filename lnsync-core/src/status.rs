//! User-facing progress reporting for a sync pass.
//!
//! This is the readable run transcript, separate from `tracing` logs.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Receives progress messages during a pass.
pub trait StatusSink: Send + Sync {
    fn append_line(&self, text: &str);

    /// Detail shown only in diagnostic mode.
    fn append_diagnostic(&self, text: &str);

    /// Start a timed step; `append_timed_finish` closes it.
    fn append_timed_start(&self, text: &str);

    fn append_timed_finish(&self);
}

/// Seconds with one decimal, as used throughout the transcript.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.1} s", elapsed.as_secs_f64())
}

pub fn indent_diagnostic(text: &str) -> String {
    text.lines()
        .map(|line| format!("   {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A status sink that keeps every line in memory.
///
/// Used to write the run log after a pass and to inspect output in tests.
#[derive(Default)]
pub struct Transcript {
    diagnostic_mode: bool,
    state: Mutex<TranscriptState>,
}

#[derive(Default)]
struct TranscriptState {
    lines: Vec<String>,
    /// Index of the line opened by the running timed step.
    pending: Option<(usize, Instant)>,
}

impl Transcript {
    pub fn new(diagnostic_mode: bool) -> Self {
        Transcript {
            diagnostic_mode,
            state: Mutex::default(),
        }
    }

    pub fn diagnostic_mode(&self) -> bool {
        self.diagnostic_mode
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().lines.clone()
    }

    pub fn contents(&self) -> String {
        let mut text = self.lines().join("\n");
        text.push('\n');
        text
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TranscriptState> {
        // A panic while holding the lock leaves plain strings behind; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, line: String) {
        self.lock().lines.push(line);
    }
}

impl StatusSink for Transcript {
    fn append_line(&self, text: &str) {
        self.push(text.to_string());
    }

    fn append_diagnostic(&self, text: &str) {
        if self.diagnostic_mode {
            self.push(indent_diagnostic(text));
        }
    }

    fn append_timed_start(&self, text: &str) {
        let mut state = self.lock();
        let idx = state.lines.len();
        state.lines.push(text.to_string());
        state.pending = Some((idx, Instant::now()));
    }

    fn append_timed_finish(&self) {
        let mut state = self.lock();
        if let Some((idx, started)) = state.pending.take() {
            let suffix = format!(" (done in {})", format_elapsed(started.elapsed()));
            if let Some(line) = state.lines.get_mut(idx) {
                line.push_str(&suffix);
            }
        }
    }
}
