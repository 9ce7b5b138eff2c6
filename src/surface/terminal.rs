use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use super::Surface;

type Sink = Box<dyn Write + Send>;

/// Renders the two regions to stdout and alerts to stderr.
///
/// The prompt field is whatever the REPL last stored with
/// [`TerminalSurface::set_prompt`].
pub struct TerminalSurface {
    prompt: Mutex<String>,
    out: Mutex<Sink>,
    err: Mutex<Sink>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::with_sinks(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Write regions and alerts somewhere other than the terminal.
    pub fn with_sinks(out: Sink, err: Sink) -> Self {
        Self {
            prompt: Mutex::new(String::new()),
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    pub fn set_prompt(&self, prompt: &str) {
        *self.prompt.lock().unwrap_or_else(PoisonError::into_inner) = prompt.to_string();
    }

    fn region(&self, label: &str, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // A closed stdout is not worth failing the operation over
        let _ = writeln!(out, "{}", format_region(label, text));
        let _ = out.flush();
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for TerminalSurface {
    fn prompt_text(&self) -> String {
        self.prompt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_summary(&self, text: &str) {
        self.region("summary", text);
    }

    fn set_categorization(&self, text: &str) {
        self.region("categorization", text);
    }

    fn alert(&self, message: &str) {
        let mut err = self.err.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(err, "  ! {message}");
        let _ = err.flush();
    }
}

/// Single-line text sits next to its label; anything longer goes below it,
/// indented.
fn format_region(label: &str, text: &str) -> String {
    if !text.contains('\n') {
        return format!("[{label}] {text}");
    }
    let mut out = format!("[{label}]");
    for line in text.lines() {
        out.push_str("\n  ");
        out.push_str(line);
    }
    out
}
