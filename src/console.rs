//! Terminal output for a sync pass.

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use lnsync_core::status::{StatusSink, Transcript, format_elapsed, indent_diagnostic};
use owo_colors::OwoColorize;

/// Prints progress as it happens and keeps a plain transcript for the
/// run log.
pub struct ConsoleStatus {
    transcript: Transcript,
    /// Start of the timed step whose line is still open on the terminal.
    open_step: Mutex<Option<Instant>>,
}

impl ConsoleStatus {
    pub fn new(diagnostic_mode: bool) -> Self {
        ConsoleStatus {
            transcript: Transcript::new(diagnostic_mode),
            open_step: Mutex::new(None),
        }
    }

    /// Write the transcript of this run to `path`, replacing the last one.
    pub fn save_log(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        std::fs::write(path, self.transcript.contents())
            .with_context(|| format!("Failed to write run log to {}", path.display()))
    }

    /// Print `text` on its own line, closing an open timed step first.
    fn print(&self, text: &str) {
        let mut open = self.open_step.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = std::io::stdout().lock();
        if open.take().is_some() {
            let _ = writeln!(stdout);
        }
        let _ = writeln!(stdout, "{}", text);
    }
}

impl StatusSink for ConsoleStatus {
    fn append_line(&self, text: &str) {
        self.transcript.append_line(text);
        if text.starts_with("===") {
            self.print(&text.red().bold().to_string());
        } else if text.starts_with("Summary:") {
            self.print(&text.bold().to_string());
        } else {
            self.print(text);
        }
    }

    fn append_diagnostic(&self, text: &str) {
        self.transcript.append_diagnostic(text);
        if self.transcript.diagnostic_mode() {
            self.print(&indent_diagnostic(text).dimmed().to_string());
        }
    }

    fn append_timed_start(&self, text: &str) {
        self.transcript.append_timed_start(text);

        let mut open = self.open_step.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = std::io::stdout().lock();
        if open.is_some() {
            let _ = writeln!(stdout);
        }
        let _ = write!(stdout, "{}...", text);
        let _ = stdout.flush();
        *open = Some(Instant::now());
    }

    fn append_timed_finish(&self) {
        self.transcript.append_timed_finish();

        let mut open = self.open_step.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = std::io::stdout().lock();
        match open.take() {
            Some(started) => {
                let suffix = format!("(done in {})", format_elapsed(started.elapsed()));
                let _ = writeln!(stdout, " {}", suffix.dimmed());
            }
            // Other output came in between; the step line was already closed
            None => {
                let _ = writeln!(stdout, "{}", "   done".dimmed());
            }
        }
    }
}
